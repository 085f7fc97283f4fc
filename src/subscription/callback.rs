// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback management for change-event subscriptions.
//!
//! This module provides the core types for managing subscription callbacks:
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Registry for storing and dispatching callbacks
//! - [`DispatchReport`] - Outcome of delivering one event

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::CallbackError;
use crate::event::ChangeEvent;

/// Unique identifier for a subscription.
///
/// IDs increase monotonically within a registry, which is also the order
/// in which callbacks are invoked.
///
/// # Examples
///
/// ```
/// use dakota_motion::subscription::CallbackRegistry;
///
/// let registry = CallbackRegistry::new();
/// let id = registry.register(|event| println!("{event}"));
///
/// assert!(registry.unsubscribe(id));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Creates a new subscription ID with the given value.
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Stored form of every callback; infallible callbacks always return `Ok`.
type ChangeCallback = Arc<dyn Fn(&ChangeEvent) -> Result<(), String> + Send + Sync>;

/// Outcome of dispatching one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Number of callbacks that completed successfully.
    pub delivered: usize,
    /// Failures of the remaining callbacks, in invocation order.
    pub failures: Vec<CallbackError>,
}

impl DispatchReport {
    /// Returns `true` if every callback succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Registry for change-event callbacks.
///
/// Callbacks run synchronously, in registration order. A callback that
/// returns an error or panics is reported in the [`DispatchReport`] and
/// does not prevent delivery to the callbacks after it.
///
/// # Thread Safety
///
/// The registry uses `parking_lot::RwLock` and can be shared across tasks.
/// The lock is not held while callbacks run, so a callback may subscribe,
/// unsubscribe or stop its monitor.
pub struct CallbackRegistry {
    /// Counter for generating unique subscription IDs.
    next_id: AtomicU64,
    /// Callbacks keyed by ID, which keeps them in registration order.
    callbacks: RwLock<BTreeMap<SubscriptionId, ChangeCallback>>,
}

impl CallbackRegistry {
    /// Creates a new empty callback registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            callbacks: RwLock::new(BTreeMap::new()),
        }
    }

    /// Generates a new unique subscription ID.
    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a callback for change events.
    pub fn register<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.insert(Arc::new(move |event: &ChangeEvent| {
            callback(event);
            Ok(())
        }))
    }

    /// Registers a callback that can report failure.
    ///
    /// An `Err` is turned into [`CallbackError::Failed`] at dispatch time.
    pub fn register_fallible<F, E>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) -> Result<(), E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        self.insert(Arc::new(move |event: &ChangeEvent| {
            callback(event).map_err(|e| e.to_string())
        }))
    }

    fn insert(&self, callback: ChangeCallback) -> SubscriptionId {
        let id = self.next_id();
        self.callbacks.write().insert(id, callback);
        id
    }

    /// Unregisters a callback by its subscription ID.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks.write().remove(&id).is_some()
    }

    /// Clears all callbacks.
    pub fn clear(&self) {
        self.callbacks.write().clear();
    }

    /// Delivers an event to every registered callback.
    ///
    /// The set of callbacks is captured when dispatch starts; callbacks
    /// added or removed during dispatch take effect for the next event.
    pub fn dispatch(&self, event: &ChangeEvent) -> DispatchReport {
        let snapshot: Vec<(SubscriptionId, ChangeCallback)> = self
            .callbacks
            .read()
            .iter()
            .map(|(id, cb)| (*id, Arc::clone(cb)))
            .collect();

        let mut report = DispatchReport::default();
        for (subscription, callback) in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(message)) => report.failures.push(CallbackError::Failed {
                    subscription,
                    message,
                }),
                Err(payload) => report.failures.push(CallbackError::Panicked {
                    subscription,
                    message: panic_message(payload.as_ref()),
                }),
            }
        }
        report
    }

    /// Returns the total number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.callbacks.read().len()
    }

    /// Returns `true` if there are no registered callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.read().is_empty()
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
