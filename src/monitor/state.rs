// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Monitor lifecycle state and the debounced pin value.

use std::fmt;

use serde::Serialize;

/// Lifecycle state of a motion monitor.
///
/// ```text
/// Unconfigured --configure ok--> Armed --tick--> Sampling --read ok--> Armed
///                                                   |
///                                               read failed
///                                                   v
///                  Armed <--configure ok-- Recovering --configure failed--> Recovering
/// ```
///
/// `Stopped` is entered only through an explicit stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    /// The line has never been configured successfully.
    #[default]
    Unconfigured,
    /// The line is configured; the next tick samples it.
    Armed,
    /// A read is in flight.
    Sampling,
    /// The last read or configure failed; the next tick reconfigures.
    Recovering,
    /// The monitor was stopped and schedules no further ticks.
    Stopped,
}

impl MonitorState {
    /// Returns `true` if the line is configured and being sampled.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        matches!(self, Self::Armed | Self::Sampling)
    }

    /// Returns the lowercase name of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Armed => "armed",
            Self::Sampling => "sampling",
            Self::Recovering => "recovering",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The last value reported to subscribers.
///
/// A change event is emitted if and only if a new sample differs from this
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StableState(bool);

impl StableState {
    /// Creates a stable state holding `value`.
    #[must_use]
    pub const fn new(value: bool) -> Self {
        Self(value)
    }

    /// Returns the stable value.
    #[must_use]
    pub const fn value(&self) -> bool {
        self.0
    }

    /// Folds a sample into the state. Returns `true` if the value changed.
    pub fn update(&mut self, sample: bool) -> bool {
        if sample == self.0 {
            return false;
        }
        self.0 = sample;
        true
    }
}
