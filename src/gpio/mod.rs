// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hardware capability boundary.
//!
//! The monitor depends only on the narrow [`GpioBackend`] trait: configure a
//! line, read a line, release a line. Backends are blocking; the
//! [`PinReader`](crate::reader::PinReader) moves every call onto the blocking
//! pool and bounds it with a timeout.
//!
//! # Backends
//!
//! - [`MockGpio`]: in-memory scripted backend for tests and hosts without
//!   hardware
//! - `RppalGpio`: Raspberry Pi backend built on `rppal` (feature `rppal`)

mod mock;
#[cfg(feature = "rppal")]
mod raspberry;

pub use mock::MockGpio;
#[cfg(feature = "rppal")]
pub use raspberry::RppalGpio;

use crate::error::{ConfigError, ReadError};
use crate::types::PinHandle;

/// Platform GPIO capability used by the monitor.
///
/// Implementations must give `configure` overwrite semantics: configuring a
/// line that is already configured replaces the previous configuration.
pub trait GpioBackend: Send + Sync {
    /// Configures the line described by `handle`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the line cannot be claimed or configured.
    fn configure(&self, handle: &PinHandle) -> Result<(), ConfigError>;

    /// Samples the BCM line once. `true` means the line is high.
    ///
    /// # Errors
    ///
    /// Returns `ReadError` if the line is not configured or the sample
    /// could not be obtained.
    fn read(&self, line: u8) -> Result<bool, ReadError>;

    /// Releases any driver resources held for the line.
    fn release(&self, line: u8);
}
