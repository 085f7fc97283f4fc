// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling interval type.

use std::fmt;
use std::time::Duration;

use crate::error::ValueError;

/// Time between two monitor ticks.
///
/// The interval is never zero. Hardware calls made during a tick are bounded
/// by a timeout that must stay below the interval.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use dakota_motion::types::PollInterval;
///
/// let interval = PollInterval::from_millis(250).unwrap();
/// assert_eq!(interval.as_duration(), Duration::from_millis(250));
///
/// assert_eq!(PollInterval::default().as_millis(), 1000);
/// assert!(PollInterval::from_millis(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PollInterval(Duration);

impl PollInterval {
    /// The polling interval used when the host does not set one.
    pub const DEFAULT: Self = Self(Duration::from_millis(1000));

    /// Creates an interval from milliseconds.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `millis` is zero.
    pub fn from_millis(millis: u64) -> Result<Self, ValueError> {
        Self::new(Duration::from_millis(millis))
    }

    /// Creates an interval from a duration.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if the duration is shorter than one
    /// millisecond.
    pub fn new(duration: Duration) -> Result<Self, ValueError> {
        if duration < Duration::from_millis(1) {
            return Err(ValueError::OutOfRange {
                min: 1,
                max: u64::MAX,
                actual: 0,
            });
        }
        Ok(Self(duration))
    }

    /// Returns the interval as a duration.
    #[must_use]
    pub const fn as_duration(&self) -> Duration {
        self.0
    }

    /// Returns the interval in whole milliseconds.
    #[must_use]
    pub fn as_millis(&self) -> u64 {
        u64::try_from(self.0.as_millis()).unwrap_or(u64::MAX)
    }

    /// Returns the hardware call timeout used when none is configured.
    ///
    /// Half the interval.
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.0 / 2
    }

    /// Checks that `timeout` is shorter than this interval.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::TimeoutTooLong` otherwise.
    pub fn check_timeout(&self, timeout: Duration) -> Result<(), ValueError> {
        if timeout.is_zero() || timeout >= self.0 {
            return Err(ValueError::TimeoutTooLong {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                interval_ms: self.as_millis(),
            });
        }
        Ok(())
    }
}

impl Default for PollInterval {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for PollInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.as_millis())
    }
}

impl TryFrom<Duration> for PollInterval {
    type Error = ValueError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
