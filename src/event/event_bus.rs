// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting change events to async consumers.

use tokio::sync::broadcast;

use super::ChangeEvent;

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Broadcasts change events to any number of async receivers.
///
/// Callback subscribers are served first; the dispatcher then publishes the
/// same event here, so receivers see events in the same order callbacks do.
///
/// # Capacity
///
/// A receiver that falls more than the capacity behind loses the oldest
/// events and gets `RecvError::Lagged`.
///
/// # Examples
///
/// ```
/// use dakota_motion::event::{ChangeEvent, EventBus};
/// use dakota_motion::types::PinHandle;
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(ChangeEvent::new(&PinHandle::bcm(17).unwrap(), true, 1));
/// assert!(rx.try_recv().unwrap().value());
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns a receiver for events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event and returns how many receivers got it.
    ///
    /// Returns 0 if there are no receivers; the event is discarded.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PinHandle;

    fn event(value: bool, sequence: u64) -> ChangeEvent {
        ChangeEvent::new(&PinHandle::bcm(17).unwrap(), value, sequence)
    }

    #[test]
    fn new_bus_has_no_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(event(true, 1)), 0);
    }

    #[test]
    fn drop_subscriber_decrements_count() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(rx);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn publish_delivers_in_order_to_every_subscriber() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.publish(event(true, 1)), 2);
        assert_eq!(bus.publish(event(false, 2)), 2);

        for rx in [&mut rx1, &mut rx2] {
            assert_eq!(rx.recv().await.unwrap().sequence(), 1);
            assert_eq!(rx.recv().await.unwrap().sequence(), 2);
        }
    }

    #[test]
    fn clone_shares_same_channel() {
        let bus1 = EventBus::with_capacity(8);
        let bus2 = bus1.clone();
        let _rx = bus1.subscribe();
        assert_eq!(bus2.subscriber_count(), 1);
    }
}
