// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pin identity and numbering.
//!
//! A [`PinHandle`] is resolved once, at construction, from the pin number the
//! host configured and the [`PinNumbering`] scheme it uses. The handle then
//! carries the BCM line the hardware backend talks to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Direction, Edge, Pull};
use crate::error::ValueError;

/// Highest BCM line exposed on the 40-pin header.
pub const MAX_BCM_LINE: u8 = 27;

/// Physical header pin to BCM line, indexed by `header_pin - 1`.
const BOARD_TO_BCM: [Option<u8>; 40] = [
    None,     // 1  3V3
    None,     // 2  5V
    Some(2),  // 3
    None,     // 4  5V
    Some(3),  // 5
    None,     // 6  GND
    Some(4),  // 7
    Some(14), // 8
    None,     // 9  GND
    Some(15), // 10
    Some(17), // 11
    Some(18), // 12
    Some(27), // 13
    None,     // 14 GND
    Some(22), // 15
    Some(23), // 16
    None,     // 17 3V3
    Some(24), // 18
    Some(10), // 19
    None,     // 20 GND
    Some(9),  // 21
    Some(25), // 22
    Some(11), // 23
    Some(8),  // 24
    None,     // 25 GND
    Some(7),  // 26
    None,     // 27 ID_SD
    None,     // 28 ID_SC
    Some(5),  // 29
    None,     // 30 GND
    Some(6),  // 31
    Some(12), // 32
    Some(13), // 33
    None,     // 34 GND
    Some(19), // 35
    Some(16), // 36
    Some(26), // 37
    Some(20), // 38
    None,     // 39 GND
    Some(21), // 40
];

/// How pin numbers given by the host are interpreted.
///
/// # Examples
///
/// ```
/// use dakota_motion::types::PinNumbering;
///
/// assert_eq!(PinNumbering::Bcm.resolve(17).unwrap(), 17);
/// assert_eq!(PinNumbering::Board.resolve(11).unwrap(), 17);
/// assert!(PinNumbering::Board.resolve(6).is_err()); // ground
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinNumbering {
    /// Broadcom SoC line numbers.
    #[default]
    Bcm,
    /// Physical positions on the 40-pin header.
    Board,
}

impl PinNumbering {
    /// Resolves a pin number in this scheme to a BCM line.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` for numbers outside the scheme and
    /// `ValueError::NotAGpioPin` for header pins without a GPIO line.
    pub fn resolve(self, pin: u8) -> Result<u8, ValueError> {
        match self {
            Self::Bcm => {
                if pin > MAX_BCM_LINE {
                    return Err(ValueError::OutOfRange {
                        min: 0,
                        max: u64::from(MAX_BCM_LINE),
                        actual: u64::from(pin),
                    });
                }
                Ok(pin)
            }
            Self::Board => {
                if pin == 0 || usize::from(pin) > BOARD_TO_BCM.len() {
                    return Err(ValueError::OutOfRange {
                        min: 1,
                        max: BOARD_TO_BCM.len() as u64,
                        actual: u64::from(pin),
                    });
                }
                BOARD_TO_BCM[usize::from(pin) - 1].ok_or(ValueError::NotAGpioPin(pin))
            }
        }
    }

    /// Returns the lowercase keyword for this scheme.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bcm => "bcm",
            Self::Board => "board",
        }
    }
}

impl fmt::Display for PinNumbering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PinNumbering {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bcm" => Ok(Self::Bcm),
            "board" => Ok(Self::Board),
            _ => Err(ValueError::InvalidKeyword {
                kind: "pin numbering",
                value: s.to_string(),
            }),
        }
    }
}

/// Identity and electrical configuration of one input line.
///
/// Handles are immutable: the `with_*` methods return a new handle.
///
/// # Examples
///
/// ```
/// use dakota_motion::types::{Edge, PinHandle, PinNumbering, Pull};
///
/// let handle = PinHandle::new(11, PinNumbering::Board)
///     .unwrap()
///     .with_edge(Edge::Rising);
///
/// assert_eq!(handle.number(), 11);
/// assert_eq!(handle.line(), 17);
/// assert_eq!(handle.edge(), Edge::Rising);
/// assert_eq!(handle.pull(), Pull::Down);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PinHandle {
    number: u8,
    line: u8,
    numbering: PinNumbering,
    direction: Direction,
    edge: Edge,
    pull: Pull,
}

impl PinHandle {
    /// Creates an input handle with both-edge detection and a pull-down.
    ///
    /// # Errors
    ///
    /// Returns `ValueError` if `number` does not resolve to a GPIO line
    /// under `numbering`.
    pub fn new(number: u8, numbering: PinNumbering) -> Result<Self, ValueError> {
        let line = numbering.resolve(number)?;
        Ok(Self {
            number,
            line,
            numbering,
            direction: Direction::Input,
            edge: Edge::default(),
            pull: Pull::default(),
        })
    }

    /// Creates a handle for a BCM line number.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `line` exceeds [`MAX_BCM_LINE`].
    pub fn bcm(line: u8) -> Result<Self, ValueError> {
        Self::new(line, PinNumbering::Bcm)
    }

    /// Returns a copy with a different edge mode.
    #[must_use]
    pub const fn with_edge(mut self, edge: Edge) -> Self {
        self.edge = edge;
        self
    }

    /// Returns a copy with a different pull setting.
    #[must_use]
    pub const fn with_pull(mut self, pull: Pull) -> Self {
        self.pull = pull;
        self
    }

    /// Returns the pin number as configured by the host.
    #[must_use]
    pub const fn number(&self) -> u8 {
        self.number
    }

    /// Returns the resolved BCM line.
    #[must_use]
    pub const fn line(&self) -> u8 {
        self.line
    }

    /// Returns the numbering scheme of [`number`](Self::number).
    #[must_use]
    pub const fn numbering(&self) -> PinNumbering {
        self.numbering
    }

    /// Returns the line direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the edge-detection mode.
    #[must_use]
    pub const fn edge(&self) -> Edge {
        self.edge
    }

    /// Returns the pull-resistor setting.
    #[must_use]
    pub const fn pull(&self) -> Pull {
        self.pull
    }
}

impl fmt::Display for PinHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.numbering {
            PinNumbering::Bcm => write!(f, "GPIO{}", self.line),
            PinNumbering::Board => write!(f, "pin {} (GPIO{})", self.number, self.line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcm_accepts_header_lines() {
        for line in 0..=MAX_BCM_LINE {
            assert_eq!(PinNumbering::Bcm.resolve(line).unwrap(), line);
        }
        assert!(PinNumbering::Bcm.resolve(28).is_err());
    }

    #[test]
    fn board_maps_every_gpio_once() {
        let mut seen: Vec<u8> = (1..=40)
            .filter_map(|pin| PinNumbering::Board.resolve(pin).ok())
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen, (2..=MAX_BCM_LINE).collect::<Vec<_>>());
    }

    #[test]
    fn board_rejects_power_and_out_of_range() {
        assert_eq!(
            PinNumbering::Board.resolve(1).unwrap_err(),
            ValueError::NotAGpioPin(1)
        );
        assert!(matches!(
            PinNumbering::Board.resolve(0),
            Err(ValueError::OutOfRange { .. })
        ));
        assert!(matches!(
            PinNumbering::Board.resolve(41),
            Err(ValueError::OutOfRange { .. })
        ));
    }

    #[test]
    fn handle_defaults() {
        let handle = PinHandle::bcm(17).unwrap();
        assert_eq!(handle.direction(), Direction::Input);
        assert_eq!(handle.edge(), Edge::Both);
        assert_eq!(handle.pull(), Pull::Down);
        assert_eq!(handle.to_string(), "GPIO17");
    }

    #[test]
    fn handle_display_board() {
        let handle = PinHandle::new(11, PinNumbering::Board).unwrap();
        assert_eq!(handle.to_string(), "pin 11 (GPIO17)");
    }

    #[test]
    fn numbering_parse() {
        assert_eq!("BOARD".parse::<PinNumbering>().unwrap(), PinNumbering::Board);
        assert!("wiringpi".parse::<PinNumbering>().is_err());
    }
}
