// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-tick state machine of the motion monitor.
//!
//! [`MonitorCore`] holds the reader, the lifecycle state and the stable
//! value, and advances them one tick at a time. The running monitor drives
//! it from a timer; hosts with their own scheduler can drive it directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;

use parking_lot::Mutex;

use super::state::{MonitorState, StableState};
use super::stats::{MonitorStats, StatsCounters};
use crate::error::{ConfigError, ReadError};
use crate::event::ChangeEvent;
use crate::reader::PinReader;
use crate::types::PinHandle;

/// State visible outside the tick loop.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    state: Mutex<MonitorState>,
    stable: AtomicBool,
    stopped: AtomicBool,
    pub(crate) stats: StatsCounters,
    /// Held by the dispatcher while it delivers one event.
    pub(crate) dispatch_gate: Mutex<()>,
    pub(crate) dispatcher_thread: Mutex<Option<ThreadId>>,
}

impl Shared {
    pub(crate) fn state(&self) -> MonitorState {
        *self.state.lock()
    }

    fn set_state(&self, next: MonitorState) {
        let mut state = self.state.lock();
        if *state != MonitorState::Stopped {
            *state = next;
        }
    }

    pub(crate) fn stable(&self) -> bool {
        self.stable.load(Ordering::Acquire)
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Marks the monitor stopped. Returns `false` if it already was.
    pub(crate) fn mark_stopped(&self) -> bool {
        let first = !self.stopped.swap(true, Ordering::AcqRel);
        *self.state.lock() = MonitorState::Stopped;
        first
    }

    pub(crate) fn stats(&self) -> MonitorStats {
        self.stats.snapshot()
    }
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The sample matched the stable value.
    Unchanged(bool),
    /// The sample differed from the stable value.
    Changed(ChangeEvent),
    /// The read failed; the line was reconfigured with the given result.
    ReadFailed {
        /// Why the read failed.
        error: ReadError,
        /// Result of the immediate reconfiguration.
        rearm: Result<(), ConfigError>,
    },
    /// A pending configuration succeeded; the next tick samples.
    Rearmed,
    /// A pending configuration failed again; the next tick retries.
    ConfigureFailed(ConfigError),
    /// The monitor is stopped and did nothing.
    Stopped,
}

/// Tick-by-tick motion monitor state machine.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use dakota_motion::gpio::MockGpio;
/// use dakota_motion::monitor::{MonitorCore, MonitorState, TickOutcome};
/// use dakota_motion::reader::GpioChip;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let gpio = Arc::new(MockGpio::new());
/// gpio.push_reads(17, [false, true, true]);
///
/// let chip = GpioChip::bcm(gpio.clone());
/// let mut core = MonitorCore::new(chip.claim(17).unwrap(), false);
///
/// core.arm().await.unwrap();
/// assert_eq!(core.state(), MonitorState::Armed);
///
/// assert_eq!(core.tick().await, TickOutcome::Unchanged(false));
/// assert!(matches!(core.tick().await, TickOutcome::Changed(e) if e.value()));
/// assert_eq!(core.tick().await, TickOutcome::Unchanged(true));
/// # }
/// ```
#[derive(Debug)]
pub struct MonitorCore {
    reader: PinReader,
    state: MonitorState,
    stable: StableState,
    last_sequence: u64,
    shared: Arc<Shared>,
}

impl MonitorCore {
    /// Creates an unconfigured core with the given initial stable value.
    #[must_use]
    pub fn new(reader: PinReader, initial_state: bool) -> Self {
        let shared = Arc::new(Shared::default());
        shared.stable.store(initial_state, Ordering::Release);
        Self {
            reader,
            state: MonitorState::Unconfigured,
            stable: StableState::new(initial_state),
            last_sequence: 0,
            shared,
        }
    }

    pub(crate) fn shared(&self) -> Arc<Shared> {
        Arc::clone(&self.shared)
    }

    pub(crate) fn reader_mut(&mut self) -> &mut PinReader {
        &mut self.reader
    }

    /// Replaces the stable value; only meaningful before the first tick.
    pub(crate) fn set_initial_state(&mut self, value: bool) {
        self.stable = StableState::new(value);
        self.shared.stable.store(value, Ordering::Release);
    }

    /// Returns the line being monitored.
    #[must_use]
    pub fn handle(&self) -> &PinHandle {
        self.reader.handle()
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Returns the last reported value.
    #[must_use]
    pub fn stable_state(&self) -> bool {
        self.stable.value()
    }

    /// Returns a snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> MonitorStats {
        self.shared.stats()
    }

    fn transition(&mut self, next: MonitorState) {
        if self.state != next {
            tracing::debug!(pin = %self.reader.handle(), from = %self.state, to = %next, "Monitor state change");
        }
        self.state = next;
        self.shared.set_state(next);
    }

    async fn configure(&mut self) -> Result<(), ConfigError> {
        StatsCounters::bump(&self.shared.stats.configure_attempts);
        let result = self.reader.configure().await;
        if let Err(e) = &result {
            StatsCounters::bump(&self.shared.stats.configure_failures);
            tracing::error!(pin = %self.reader.handle(), error = %e, "Failed to set up GPIO pin");
        }
        result
    }

    /// Performs the initial configuration.
    ///
    /// On success the core is `Armed`. On failure it stays `Unconfigured`
    /// and every following tick retries the configuration.
    ///
    /// # Errors
    ///
    /// Returns the `ConfigError` of the failed attempt.
    pub async fn arm(&mut self) -> Result<(), ConfigError> {
        if self.state == MonitorState::Stopped {
            return Ok(());
        }
        self.configure().await?;
        self.transition(MonitorState::Armed);
        Ok(())
    }

    /// Advances the state machine by one tick.
    ///
    /// - `Armed`: samples the line; a sample that differs from the stable
    ///   value updates it and yields [`TickOutcome::Changed`]. A failed read
    ///   moves to `Recovering` and reconfigures immediately.
    /// - `Unconfigured` / `Recovering`: retries the configuration; success
    ///   arms the line for the next tick.
    pub async fn tick(&mut self) -> TickOutcome {
        if self.state == MonitorState::Stopped {
            return TickOutcome::Stopped;
        }
        StatsCounters::bump(&self.shared.stats.ticks);

        match self.state {
            MonitorState::Unconfigured | MonitorState::Recovering => {
                match self.configure().await {
                    Ok(()) => {
                        self.transition(MonitorState::Armed);
                        TickOutcome::Rearmed
                    }
                    Err(e) => TickOutcome::ConfigureFailed(e),
                }
            }
            MonitorState::Armed | MonitorState::Sampling => self.sample().await,
            MonitorState::Stopped => TickOutcome::Stopped,
        }
    }

    async fn sample(&mut self) -> TickOutcome {
        self.transition(MonitorState::Sampling);
        StatsCounters::bump(&self.shared.stats.reads);

        match self.reader.read().await {
            Ok(value) => {
                self.transition(MonitorState::Armed);
                if !self.stable.update(value) {
                    tracing::trace!(pin = %self.reader.handle(), value, "No change");
                    return TickOutcome::Unchanged(value);
                }
                self.shared.stable.store(value, Ordering::Release);
                self.last_sequence += 1;
                StatsCounters::bump(&self.shared.stats.events_emitted);
                let event = ChangeEvent::new(self.reader.handle(), value, self.last_sequence);
                tracing::debug!(pin = %self.reader.handle(), value, sequence = self.last_sequence, "Pin value changed");
                TickOutcome::Changed(event)
            }
            Err(error) => {
                StatsCounters::bump(&self.shared.stats.read_failures);
                tracing::error!(pin = %self.reader.handle(), error = %error, "Failed to read GPIO pin");
                self.transition(MonitorState::Recovering);
                let rearm = self.configure().await;
                if rearm.is_ok() {
                    self.transition(MonitorState::Armed);
                }
                TickOutcome::ReadFailed { error, rearm }
            }
        }
    }

    pub(crate) fn mark_stopped(&mut self) {
        self.state = MonitorState::Stopped;
        self.shared.mark_stopped();
    }
}
