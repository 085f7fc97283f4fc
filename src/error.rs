// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the motion monitor.
//!
//! Every error in this crate is recoverable: configuration and read failures
//! are retried by the monitor on the next tick, and subscriber failures are
//! isolated so delivery to other subscribers continues.

use thiserror::Error;

use crate::subscription::SubscriptionId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The pin could not be claimed or configured.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A sample could not be obtained from the pin.
    #[error("read error: {0}")]
    Read(#[from] ReadError),

    /// A subscriber callback failed.
    #[error("callback error: {0}")]
    Callback(#[from] CallbackError),

    /// Configuration input could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Errors related to value validation and constraints.
///
/// These errors occur when attempting to create constrained types
/// with invalid values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
        /// The actual value that was provided.
        actual: u64,
    },

    /// The header pin does not carry a GPIO line (power, ground or ID EEPROM).
    #[error("board pin {0} is not a GPIO line")]
    NotAGpioPin(u8),

    /// The hardware call timeout must be shorter than the polling interval.
    #[error("timeout of {timeout_ms} ms must be shorter than the {interval_ms} ms interval")]
    TimeoutTooLong {
        /// The requested timeout in milliseconds.
        timeout_ms: u64,
        /// The polling interval in milliseconds.
        interval_ms: u64,
    },

    /// An unknown keyword was given for an enumerated setting.
    #[error("invalid {kind}: {value}")]
    InvalidKeyword {
        /// The setting being parsed (`edge`, `pull`, ...).
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

/// Errors raised while claiming or configuring a pin.
///
/// All variants are recoverable by calling `configure` again.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The process lacks permission to access the GPIO device.
    #[error("permission denied for GPIO {line}: {message}")]
    PermissionDenied {
        /// The BCM line number.
        line: u8,
        /// Description from the driver.
        message: String,
    },

    /// The line is held by another process or driver.
    #[error("GPIO {0} is not available")]
    PinUnavailable(u8),

    /// The line is already owned by another reader in this process.
    #[error("GPIO {0} is already claimed by another reader")]
    AlreadyClaimed(u8),

    /// The line number does not exist on this hardware.
    #[error("invalid GPIO line {0}")]
    InvalidPin(u8),

    /// The configuration call did not complete in time.
    #[error("configuring GPIO {line} timed out after {timeout_ms} ms")]
    Timeout {
        /// The BCM line number.
        line: u8,
        /// The timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// Any other driver failure.
    #[error("failed to configure GPIO {line}: {message}")]
    Hardware {
        /// The BCM line number.
        line: u8,
        /// Description from the driver.
        message: String,
    },
}

/// Errors raised while sampling a pin.
///
/// All variants are recoverable; the monitor reconfigures the pin after one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The line has not been configured (or its configuration was lost).
    #[error("GPIO {0} is not configured")]
    NotConfigured(u8),

    /// The underlying I/O operation failed.
    #[error("failed to read GPIO {line}: {message}")]
    Io {
        /// The BCM line number.
        line: u8,
        /// Description from the driver.
        message: String,
    },

    /// The read did not complete in time.
    #[error("reading GPIO {line} timed out after {timeout_ms} ms")]
    Timeout {
        /// The BCM line number.
        line: u8,
        /// The timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },
}

/// Errors raised by subscriber callbacks during dispatch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// The callback returned an error.
    #[error("subscriber {subscription} failed: {message}")]
    Failed {
        /// The failing subscription.
        subscription: SubscriptionId,
        /// The error reported by the callback.
        message: String,
    },

    /// The callback panicked.
    #[error("subscriber {subscription} panicked: {message}")]
    Panicked {
        /// The failing subscription.
        subscription: SubscriptionId,
        /// The panic payload, if it was a string.
        message: String,
    },
}

impl CallbackError {
    /// Returns the subscription that failed.
    #[must_use]
    pub fn subscription(&self) -> SubscriptionId {
        match self {
            Self::Failed { subscription, .. } | Self::Panicked { subscription, .. } => {
                *subscription
            }
        }
    }
}

/// Errors related to parsing host configuration.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The parsed configuration failed validation.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValueError),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 0,
            max: 27,
            actual: 40,
        };
        assert_eq!(err.to_string(), "value 40 is out of range [0, 27]");
    }

    #[test]
    fn error_from_config_error() {
        let err: Error = ConfigError::PinUnavailable(17).into();
        assert!(matches!(err, Error::Config(ConfigError::PinUnavailable(17))));
    }

    #[test]
    fn read_error_display() {
        let err = ReadError::Timeout {
            line: 17,
            timeout_ms: 500,
        };
        assert_eq!(err.to_string(), "reading GPIO 17 timed out after 500 ms");
    }

    #[test]
    fn callback_error_reports_subscription() {
        let err = CallbackError::Panicked {
            subscription: SubscriptionId::new(3),
            message: "boom".to_string(),
        };
        assert_eq!(err.subscription(), SubscriptionId::new(3));
        assert_eq!(err.to_string(), "subscriber Sub(3) panicked: boom");
    }

    #[test]
    fn parse_error_wraps_value_error() {
        let err: ParseError = ValueError::NotAGpioPin(1).into();
        assert_eq!(
            err.to_string(),
            "invalid configuration: board pin 1 is not a GPIO line"
        );
    }
}
