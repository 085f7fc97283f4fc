// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Motion sensor accessory model.
//!
//! [`MotionSensor`] is the consumer side of a monitor: it subscribes to
//! change events and exposes them the way a home-automation host expects
//! a motion sensor to look (a "motion detected" flag, an "active" status
//! and fixed accessory information).

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::monitor::MonitorHandle;
use crate::subscription::{Subscribable, SubscriptionId};

/// Manufacturer reported for the sensor.
pub const MANUFACTURER: &str = "Dakota Alert, Inc.";

/// Model reported for the sensor.
pub const MODEL: &str = "RE-4k Plus";

/// Serial number reported for the sensor. The hardware does not expose one.
pub const SERIAL_NUMBER: &str = "unknown";

/// Static accessory information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryInfo {
    /// Display name.
    pub name: String,
    /// Manufacturer name.
    pub manufacturer: &'static str,
    /// Model name.
    pub model: &'static str,
    /// Serial number.
    pub serial_number: &'static str,
}

/// A motion sensor accessory backed by a running monitor.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use dakota_motion::gpio::MockGpio;
/// use dakota_motion::reader::GpioChip;
/// use dakota_motion::sensor::MotionSensor;
/// use dakota_motion::types::PollInterval;
/// use dakota_motion::MotionMonitor;
///
/// # #[tokio::main]
/// # async fn main() {
/// let gpio = Arc::new(MockGpio::new());
/// let chip = GpioChip::bcm(gpio.clone());
/// let handle = MotionMonitor::start_with(&chip, 17, PollInterval::from_millis(10).unwrap()).unwrap();
///
/// let sensor = MotionSensor::attach("Driveway", &handle);
/// assert_eq!(sensor.info().model, "RE-4k Plus");
///
/// gpio.set_level(17, true);
/// tokio::time::sleep(Duration::from_millis(100)).await;
/// assert!(sensor.motion_detected());
/// handle.stop();
/// # }
/// ```
pub struct MotionSensor {
    name: String,
    handle: MonitorHandle,
    motion: Arc<AtomicBool>,
    subscription: SubscriptionId,
}

impl MotionSensor {
    /// Subscribes a new sensor to `handle`.
    ///
    /// The motion flag starts from the monitor's current stable value.
    #[must_use]
    pub fn attach(name: impl Into<String>, handle: &MonitorHandle) -> Self {
        let name = name.into();
        let motion = Arc::new(AtomicBool::new(handle.stable_state()));

        let flag = Arc::clone(&motion);
        let subscription = handle.subscribe(move |event| {
            flag.store(event.value(), Ordering::Release);
        });

        tracing::debug!(name = %name, pin = %handle.pin(), %subscription, "Motion sensor attached");

        Self {
            name,
            handle: handle.clone(),
            motion,
            subscription,
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the "motion detected" characteristic.
    #[must_use]
    pub fn motion_detected(&self) -> bool {
        self.motion.load(Ordering::Acquire)
    }

    /// Returns the "status active" characteristic.
    ///
    /// `true` while the pin is configured and being sampled; `false` while
    /// the monitor is recovering, has never armed the pin, or is stopped.
    #[must_use]
    pub fn status_active(&self) -> bool {
        self.handle.state().is_armed()
    }

    /// Returns the accessory information.
    #[must_use]
    pub fn info(&self) -> AccessoryInfo {
        AccessoryInfo {
            name: self.name.clone(),
            manufacturer: MANUFACTURER,
            model: MODEL,
            serial_number: SERIAL_NUMBER,
        }
    }

    /// Returns the monitor this sensor is attached to.
    #[must_use]
    pub fn monitor(&self) -> &MonitorHandle {
        &self.handle
    }
}

impl Drop for MotionSensor {
    fn drop(&mut self) {
        self.handle.unsubscribe(self.subscription);
    }
}

impl fmt::Debug for MotionSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionSensor")
            .field("name", &self.name)
            .field("motion_detected", &self.motion_detected())
            .field("status_active", &self.status_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MotionMonitor;
    use crate::gpio::MockGpio;
    use crate::reader::GpioChip;
    use crate::types::PollInterval;
    use std::time::Duration;

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached within 1s");
    }

    fn start(gpio: &Arc<MockGpio>, pin: u8) -> MonitorHandle {
        let chip = GpioChip::bcm(gpio.clone());
        MotionMonitor::start_with(&chip, pin, PollInterval::from_millis(10).unwrap()).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn tracks_motion() {
        let gpio = Arc::new(MockGpio::new());
        let handle = start(&gpio, 17);
        let sensor = MotionSensor::attach("Driveway", &handle);
        assert!(!sensor.motion_detected());

        gpio.set_level(17, true);
        wait_until(|| sensor.motion_detected()).await;

        gpio.set_level(17, false);
        wait_until(|| !sensor.motion_detected()).await;

        handle.stop();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn status_follows_monitor_state() {
        let gpio = Arc::new(MockGpio::new());
        let handle = start(&gpio, 22);
        let sensor = MotionSensor::attach("Gate", &handle);

        wait_until(|| sensor.status_active()).await;
        handle.stop();
        assert!(!sensor.status_active());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn drop_unsubscribes() {
        let gpio = Arc::new(MockGpio::new());
        let handle = start(&gpio, 5);

        let sensor = MotionSensor::attach("Porch", &handle);
        let id = sensor.subscription;
        drop(sensor);

        assert!(!handle.unsubscribe(id));
        handle.stop();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn info_constants() {
        let gpio = Arc::new(MockGpio::new());
        let handle = start(&gpio, 6);
        let sensor = MotionSensor::attach("Shed", &handle);

        let info = sensor.info();
        assert_eq!(info.name, "Shed");
        assert_eq!(info.manufacturer, "Dakota Alert, Inc.");
        assert_eq!(info.model, "RE-4k Plus");
        assert_eq!(info.serial_number, "unknown");
        assert_eq!(
            serde_json::to_value(&info).unwrap()["serialNumber"],
            "unknown"
        );
        handle.stop();
    }
}
