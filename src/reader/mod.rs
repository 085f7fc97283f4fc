// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Exclusive pin access.
//!
//! A [`GpioChip`] hands out at most one [`PinReader`] per line. The reader
//! performs configuration and single-shot reads, each bounded by a timeout,
//! and reports them as uniform results.

mod chip;
mod pin_reader;
mod reading;

pub use chip::GpioChip;
pub use pin_reader::{DEFAULT_TIMEOUT, PinReader};
pub use reading::RawReading;
