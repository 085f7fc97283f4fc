// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Monitor counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Snapshot of a monitor's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MonitorStats {
    /// Ticks handled.
    pub ticks: u64,
    /// Read calls made.
    pub reads: u64,
    /// Read calls that failed.
    pub read_failures: u64,
    /// Configure calls made, including the initial one.
    pub configure_attempts: u64,
    /// Configure calls that failed.
    pub configure_failures: u64,
    /// Change events emitted.
    pub events_emitted: u64,
    /// Subscriber callbacks that failed or panicked.
    pub callback_failures: u64,
    /// Events emitted but not yet delivered to the subscribers.
    pub pending_events: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub(crate) ticks: AtomicU64,
    pub(crate) reads: AtomicU64,
    pub(crate) read_failures: AtomicU64,
    pub(crate) configure_attempts: AtomicU64,
    pub(crate) configure_failures: AtomicU64,
    pub(crate) events_emitted: AtomicU64,
    pub(crate) callback_failures: AtomicU64,
    pub(crate) pending_events: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Counts an event handed to the dispatcher. Returns the backlog.
    pub(crate) fn enqueue(&self) -> u64 {
        self.pending_events.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn dequeue(&self) {
        self.pending_events.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MonitorStats {
        MonitorStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            configure_attempts: self.configure_attempts.load(Ordering::Relaxed),
            configure_failures: self.configure_failures.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            callback_failures: self.callback_failures.load(Ordering::Relaxed),
            pending_events: self.pending_events.load(Ordering::Relaxed),
        }
    }
}
