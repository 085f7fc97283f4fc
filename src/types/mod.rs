// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for pin configuration.
//!
//! Each type ensures values are within their valid ranges at construction
//! time, so the hardware layer never sees an impossible configuration.
//!
//! # Types
//!
//! - [`PinHandle`] - One input line: number, resolved BCM line, edge, pull
//! - [`PinNumbering`] - BCM or physical-header numbering
//! - [`Direction`], [`Edge`], [`Pull`] - Electrical settings of the line
//! - [`PollInterval`] - Non-zero time between monitor ticks

mod interval;
mod line;
mod pin;

pub use interval::PollInterval;
pub use line::{Direction, Edge, Pull};
pub use pin::{MAX_BCM_LINE, PinHandle, PinNumbering};
