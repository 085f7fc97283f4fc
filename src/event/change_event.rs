// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change event emitted when the debounced pin value flips.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::PinHandle;

/// A debounced transition of one input pin.
///
/// Events are produced by the monitor only when a sample differs from the
/// stable value it last reported. They are not retained after dispatch.
///
/// # Examples
///
/// ```
/// use dakota_motion::event::ChangeEvent;
/// use dakota_motion::types::PinHandle;
///
/// let event = ChangeEvent::new(&PinHandle::bcm(17).unwrap(), true, 1);
/// assert_eq!(event.pin(), 17);
/// assert!(event.value());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pin: u8,
    line: u8,
    value: bool,
    sequence: u64,
    timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(handle: &PinHandle, value: bool, sequence: u64) -> Self {
        Self::at(handle, value, sequence, Utc::now())
    }

    /// Creates an event with an explicit timestamp.
    #[must_use]
    pub fn at(handle: &PinHandle, value: bool, sequence: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            pin: handle.number(),
            line: handle.line(),
            value,
            sequence,
            timestamp,
        }
    }

    /// Returns the pin number as configured by the host.
    #[must_use]
    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Returns the BCM line the event was read from.
    #[must_use]
    pub fn line(&self) -> u8 {
        self.line
    }

    /// Returns the new stable value (`true` = line high = motion).
    #[must_use]
    pub fn value(&self) -> bool {
        self.value
    }

    /// Returns the position of this event in its monitor's event stream.
    ///
    /// Sequence numbers start at 1 and increase by one per event.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns when the transition was observed.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = if self.value { "high" } else { "low" };
        write!(f, "pin {} -> {level} (#{})", self.pin, self.sequence)
    }
}
