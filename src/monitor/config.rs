// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-supplied monitor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ValueError};
use crate::types::{Edge, PinHandle, PinNumbering, PollInterval, Pull};

fn default_interval_ms() -> u64 {
    PollInterval::DEFAULT.as_millis()
}

fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Configuration for one motion monitor.
///
/// Field names follow the host's JSON convention, so the minimal host
/// block `{ "pin": 17 }` is a complete configuration.
///
/// # Examples
///
/// ```
/// use dakota_motion::monitor::MonitorConfig;
/// use dakota_motion::types::Pull;
///
/// let config = MonitorConfig::from_json(r#"{ "pin": 17, "intervalMs": 250 }"#).unwrap();
/// assert_eq!(config.pin, 17);
/// assert_eq!(config.interval_ms, 250);
/// assert_eq!(config.pull, Pull::Down);
///
/// let config = MonitorConfig::new(4).with_name("Porch").with_interval_ms(500);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    /// Display name of the sensor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Pin number, interpreted according to `numbering`.
    pub pin: u8,
    /// Polling interval in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Hardware call timeout in milliseconds; half the interval if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Numbering scheme of `pin`.
    #[serde(default, skip_serializing_if = "is_default")]
    pub numbering: PinNumbering,
    /// Edge detection requested from the driver.
    #[serde(default, skip_serializing_if = "is_default")]
    pub edge: Edge,
    /// Pull resistor applied to the line.
    #[serde(default, skip_serializing_if = "is_default")]
    pub pull: Pull,
    /// Stable value assumed before the first sample.
    #[serde(default, skip_serializing_if = "is_default")]
    pub initial_state: bool,
}

impl MonitorConfig {
    /// Creates a configuration for `pin` (BCM numbering) with defaults.
    #[must_use]
    pub fn new(pin: u8) -> Self {
        Self {
            name: None,
            pin,
            interval_ms: default_interval_ms(),
            timeout_ms: None,
            numbering: PinNumbering::default(),
            edge: Edge::default(),
            pull: Pull::default(),
            initial_state: false,
        }
    }

    /// Parses and validates a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` for malformed input and
    /// `ParseError::Invalid` if the values fail validation.
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the polling interval.
    #[must_use]
    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Sets the hardware call timeout.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Sets the numbering scheme of the pin.
    #[must_use]
    pub fn with_numbering(mut self, numbering: PinNumbering) -> Self {
        self.numbering = numbering;
        self
    }

    /// Sets the edge-detection mode.
    #[must_use]
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edge = edge;
        self
    }

    /// Sets the pull resistor.
    #[must_use]
    pub fn with_pull(mut self, pull: Pull) -> Self {
        self.pull = pull;
        self
    }

    /// Sets the stable value assumed before the first sample.
    #[must_use]
    pub fn with_initial_state(mut self, initial_state: bool) -> Self {
        self.initial_state = initial_state;
        self
    }

    /// Resolves the pin handle described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns `ValueError` if the pin does not exist under `numbering`.
    pub fn pin_handle(&self) -> Result<PinHandle, ValueError> {
        Ok(PinHandle::new(self.pin, self.numbering)?
            .with_edge(self.edge)
            .with_pull(self.pull))
    }

    /// Returns the validated polling interval.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if the interval is zero.
    pub fn interval(&self) -> Result<PollInterval, ValueError> {
        PollInterval::from_millis(self.interval_ms)
    }

    /// Returns the hardware call timeout, defaulting to half the interval.
    ///
    /// # Errors
    ///
    /// Returns `ValueError` if the interval is invalid or the timeout is
    /// not shorter than it.
    pub fn timeout(&self) -> Result<Duration, ValueError> {
        let interval = self.interval()?;
        match self.timeout_ms {
            Some(ms) => {
                let timeout = Duration::from_millis(ms);
                interval.check_timeout(timeout)?;
                Ok(timeout)
            }
            None => Ok(interval.default_timeout()),
        }
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns the first `ValueError` found.
    pub fn validate(&self) -> Result<(), ValueError> {
        self.pin_handle()?;
        self.timeout()?;
        Ok(())
    }

    /// Returns the display name, falling back to the pin.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Motion Sensor {}", self.pin))
    }
}

/// Platform block listing the sensors a host wants monitored.
///
/// Only parsing lives here; each entry is started as its own monitor.
///
/// # Examples
///
/// ```
/// use dakota_motion::monitor::PlatformConfig;
///
/// let platform = PlatformConfig::from_json(r#"{
///     "platform": "DakotaMotionSensors",
///     "devices": [
///         { "name": "Driveway", "pin": 17 },
///         { "name": "Gate", "pin": 27, "intervalMs": 500 }
///     ]
/// }"#).unwrap();
///
/// assert_eq!(platform.sensors.len(), 2);
/// assert_eq!(platform.sensors[1].interval_ms, 500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Platform identifier assigned by the host.
    pub platform: String,
    /// Optional platform display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Sensors to monitor.
    #[serde(default, alias = "devices")]
    pub sensors: Vec<MonitorConfig>,
}

impl PlatformConfig {
    /// Parses and validates a platform block from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` for malformed input and
    /// `ParseError::Invalid` if any sensor fails validation.
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        let platform: Self = serde_json::from_str(json)?;
        for sensor in &platform.sensors {
            sensor.validate()?;
        }
        Ok(platform)
    }
}
