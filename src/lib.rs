// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dakota Motion - a resilient GPIO input monitor for PIR motion sensors.
//!
//! This library polls a digital input line (such as the relay output of a
//! Dakota Alert RE-4k Plus receiver) on a fixed interval and notifies
//! subscribers whenever its logical value changes.
//!
//! # Features
//!
//! - **Debounce by comparison**: an event is emitted only when a sample
//!   differs from the last reported value
//! - **Self-healing**: a failed read reconfigures the line, and a failed
//!   configuration is retried on every tick
//! - **Bounded hardware calls**: every configure and read is run on the
//!   blocking pool under a timeout shorter than the polling interval
//! - **Ordered dispatch**: every subscriber sees every event in the order
//!   it was observed; failing or panicking subscribers are isolated
//! - **Exclusive lines**: a [`GpioChip`] hands out at most one
//!   [`PinReader`] per line
//!
//! # Backends
//!
//! - [`gpio::MockGpio`]: in-memory scripted backend, always available
//! - `gpio::RppalGpio`: Raspberry Pi backend, enabled with the `rppal`
//!   feature
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use dakota_motion::{MonitorConfig, MotionMonitor, GpioChip, Subscribable};
//! use dakota_motion::gpio::MockGpio;
//!
//! #[tokio::main]
//! async fn main() -> dakota_motion::Result<()> {
//!     let chip = GpioChip::bcm(Arc::new(MockGpio::new()));
//!     let config = MonitorConfig::from_json(r#"{ "pin": 17, "intervalMs": 1000 }"#)?;
//!
//!     let monitor = MotionMonitor::from_config(&chip, &config)?;
//!     monitor.subscribe(|event| {
//!         println!("motion on pin {}: {}", event.pin(), event.value());
//!     });
//!
//!     let handle = monitor.start();
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     handle.stop();
//!     Ok(())
//! }
//! ```
//!
//! ## Async consumers
//!
//! ```no_run
//! use std::sync::Arc;
//! use dakota_motion::{GpioChip, MotionMonitor, PollInterval};
//! use dakota_motion::gpio::MockGpio;
//!
//! #[tokio::main]
//! async fn main() -> dakota_motion::Result<()> {
//!     let chip = GpioChip::bcm(Arc::new(MockGpio::new()));
//!     let handle = MotionMonitor::start_with(&chip, 17, PollInterval::DEFAULT)?;
//!
//!     let mut events = handle.events();
//!     while let Ok(event) = events.recv().await {
//!         println!("{event}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Driving the state machine yourself
//!
//! Hosts with their own scheduler can skip the timer and call
//! [`MonitorCore::tick`] directly.

pub mod error;
pub mod event;
pub mod gpio;
pub mod monitor;
pub mod reader;
pub mod sensor;
pub mod subscription;
pub mod types;

pub use error::{
    CallbackError, ConfigError, Error, ParseError, ReadError, Result, ValueError,
};
pub use event::{ChangeEvent, EventBus};
pub use gpio::GpioBackend;
pub use monitor::{
    MonitorConfig, MonitorCore, MonitorHandle, MonitorState, MonitorStats, MotionMonitor,
    PlatformConfig, TickOutcome,
};
pub use reader::{GpioChip, PinReader, RawReading};
pub use sensor::{AccessoryInfo, MotionSensor};
pub use subscription::{CallbackRegistry, Subscribable, SubscriptionId};
pub use types::{Edge, PinHandle, PinNumbering, PollInterval, Pull};
