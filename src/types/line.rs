// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Electrical settings of a GPIO line.
//!
//! This module provides the direction, edge-detection and pull-resistor
//! settings applied when a line is configured.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Direction of a GPIO line.
///
/// The monitor only ever samples lines, so `Input` is the sole variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The line is read by software.
    #[default]
    Input,
}

impl Direction {
    /// Returns the lowercase keyword for this direction.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "in",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal transitions the driver watches for.
///
/// # Examples
///
/// ```
/// use dakota_motion::types::Edge;
///
/// let edge: Edge = "both".parse().unwrap();
/// assert_eq!(edge, Edge::Both);
/// assert_eq!(Edge::default(), Edge::Both);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    /// No edge detection.
    None,
    /// Low-to-high transitions.
    Rising,
    /// High-to-low transitions.
    Falling,
    /// Transitions in either direction.
    #[default]
    Both,
}

impl Edge {
    /// Returns the lowercase keyword for this edge mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Edge {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "rising" => Ok(Self::Rising),
            "falling" => Ok(Self::Falling),
            "both" => Ok(Self::Both),
            _ => Err(ValueError::InvalidKeyword {
                kind: "edge",
                value: s.to_string(),
            }),
        }
    }
}

/// Internal pull resistor applied to the line.
///
/// The PIR sensor drives the line high on motion, so the default pulls the
/// line down to keep it from floating between detections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pull {
    /// No pull resistor.
    Off,
    /// Pull-down resistor.
    #[default]
    Down,
    /// Pull-up resistor.
    Up,
}

impl Pull {
    /// Returns the lowercase keyword for this pull setting.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Down => "down",
            Self::Up => "up",
        }
    }
}

impl fmt::Display for Pull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pull {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "down" => Ok(Self::Down),
            "up" => Ok(Self::Up),
            _ => Err(ValueError::InvalidKeyword {
                kind: "pull",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_parse_is_case_insensitive() {
        assert_eq!("RISING".parse::<Edge>().unwrap(), Edge::Rising);
        assert_eq!("Falling".parse::<Edge>().unwrap(), Edge::Falling);
    }

    #[test]
    fn edge_parse_rejects_unknown() {
        let err = "sideways".parse::<Edge>().unwrap_err();
        assert_eq!(err.to_string(), "invalid edge: sideways");
    }

    #[test]
    fn pull_accepts_none_alias() {
        assert_eq!("none".parse::<Pull>().unwrap(), Pull::Off);
    }

    #[test]
    fn defaults_match_sensor_wiring() {
        assert_eq!(Direction::default(), Direction::Input);
        assert_eq!(Edge::default(), Edge::Both);
        assert_eq!(Pull::default(), Pull::Down);
    }

    #[test]
    fn serde_uses_lowercase_keywords() {
        assert_eq!(serde_json::to_string(&Pull::Down).unwrap(), "\"down\"");
        let edge: Edge = serde_json::from_str("\"falling\"").unwrap();
        assert_eq!(edge, Edge::Falling);
    }
}
