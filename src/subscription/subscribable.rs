// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribable trait for types that publish change events.

use std::fmt;

use crate::event::ChangeEvent;
use crate::subscription::SubscriptionId;

/// Trait for types that accept change-event subscribers.
///
/// Implemented by [`MotionMonitor`](crate::MotionMonitor) (subscribe before
/// starting) and [`MonitorHandle`](crate::MonitorHandle) (subscribe while
/// running). Both share the same registry.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use dakota_motion::gpio::MockGpio;
/// use dakota_motion::reader::GpioChip;
/// use dakota_motion::subscription::Subscribable;
/// use dakota_motion::types::PollInterval;
/// use dakota_motion::MotionMonitor;
///
/// let chip = GpioChip::bcm(Arc::new(MockGpio::new()));
/// let monitor = MotionMonitor::new(chip.claim(17).unwrap(), PollInterval::DEFAULT);
///
/// let sub_id = monitor.subscribe(|event| {
///     println!("motion on pin {}: {}", event.pin(), event.value());
/// });
/// assert!(monitor.unsubscribe(sub_id));
/// ```
pub trait Subscribable {
    /// Subscribes to change events.
    ///
    /// Callbacks run in registration order on the monitor's dispatcher.
    fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static;

    /// Subscribes with a callback that can report failure.
    ///
    /// Failures are logged and counted; they never stop delivery to other
    /// subscribers.
    fn subscribe_fallible<F, E>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) -> Result<(), E> + Send + Sync + 'static,
        E: fmt::Display;

    /// Unsubscribes a callback by its subscription ID.
    ///
    /// Returns `true` if the subscription was found and removed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
