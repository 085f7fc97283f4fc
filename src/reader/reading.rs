// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raw sample type.

use chrono::{DateTime, Utc};

use crate::error::ReadError;

/// One timestamped sample of a line, or the reason it could not be taken.
///
/// Readings live for a single poll cycle: the monitor compares them with the
/// stable value and drops them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReading {
    line: u8,
    timestamp: DateTime<Utc>,
    result: Result<bool, ReadError>,
}

impl RawReading {
    /// Creates a reading stamped with the current time.
    #[must_use]
    pub fn new(line: u8, result: Result<bool, ReadError>) -> Self {
        Self {
            line,
            timestamp: Utc::now(),
            result,
        }
    }

    /// Returns the BCM line that was sampled.
    #[must_use]
    pub fn line(&self) -> u8 {
        self.line
    }

    /// Returns when the sample was taken.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the sampled level, or `None` if the sample failed.
    #[must_use]
    pub fn value(&self) -> Option<bool> {
        self.result.as_ref().ok().copied()
    }

    /// Returns the failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ReadError> {
        self.result.as_ref().err()
    }

    /// Consumes the reading and returns the underlying result.
    ///
    /// # Errors
    ///
    /// Returns the `ReadError` the sample failed with.
    pub fn into_result(self) -> Result<bool, ReadError> {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let ok = RawReading::new(17, Ok(true));
        assert_eq!(ok.value(), Some(true));
        assert!(ok.error().is_none());

        let failed = RawReading::new(17, Err(ReadError::NotConfigured(17)));
        assert_eq!(failed.value(), None);
        assert_eq!(failed.error(), Some(&ReadError::NotConfigured(17)));
        assert!(failed.into_result().is_err());
    }
}
