// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling motion monitor.
//!
//! A [`MotionMonitor`] samples one input line on a fixed interval, compares
//! each sample against the last reported value and notifies subscribers
//! only when it differs. A failed read moves the monitor into recovery,
//! where it reconfigures the line until that succeeds.

mod config;
mod core;
mod motion_monitor;
mod state;
mod stats;

pub use config::{MonitorConfig, PlatformConfig};
pub use self::core::{MonitorCore, TickOutcome};
pub use motion_monitor::{BACKLOG_WARNING, MonitorHandle, MotionMonitor};
pub use state::{MonitorState, StableState};
pub use stats::MonitorStats;
