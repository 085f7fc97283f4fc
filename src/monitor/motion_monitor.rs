// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Timer-driven motion monitor and its handle.
//!
//! Starting a monitor spawns two workers:
//!
//! - a tokio task that ticks on the polling interval and drives the
//!   [`MonitorCore`]
//! - a dispatcher on the blocking pool that delivers change events to the
//!   callbacks, then to the [`EventBus`]
//!
//! They are joined by an unbounded FIFO channel, so a slow subscriber delays
//! later deliveries but never the next tick, and events reach every
//! subscriber in the order they were observed. Events are never dropped:
//! a subscriber that stays slower than the rate of changes makes the queue
//! grow without limit. The backlog is reported as
//! [`MonitorStats::pending_events`] and logged every
//! [`BACKLOG_WARNING`] queued events.

use std::fmt;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::config::MonitorConfig;
use super::core::{MonitorCore, Shared, TickOutcome};
use super::state::MonitorState;
use super::stats::{MonitorStats, StatsCounters};
use crate::error::Error;
use crate::event::{ChangeEvent, EventBus};
use crate::reader::{GpioChip, PinReader};
use crate::subscription::{CallbackRegistry, Subscribable, SubscriptionId};
use crate::types::{PinHandle, PollInterval};

/// Backlog size at which the tick loop warns about slow subscribers.
pub const BACKLOG_WARNING: u64 = 64;

/// A motion monitor that has not been started yet.
///
/// Subscribers registered here stay registered after [`start`](Self::start).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use dakota_motion::gpio::MockGpio;
/// use dakota_motion::reader::GpioChip;
/// use dakota_motion::subscription::Subscribable;
/// use dakota_motion::types::PollInterval;
/// use dakota_motion::MotionMonitor;
///
/// # #[tokio::main]
/// # async fn main() {
/// let gpio = Arc::new(MockGpio::new());
/// let chip = GpioChip::bcm(gpio.clone());
///
/// let monitor = MotionMonitor::new(
///     chip.claim(17).unwrap(),
///     PollInterval::from_millis(10).unwrap(),
/// );
/// monitor.subscribe(|event| println!("motion: {}", event.value()));
///
/// let handle = monitor.start();
/// gpio.set_level(17, true);
/// tokio::time::sleep(Duration::from_millis(50)).await;
/// handle.stop();
/// # }
/// ```
pub struct MotionMonitor {
    core: MonitorCore,
    interval: PollInterval,
    registry: Arc<CallbackRegistry>,
    bus: EventBus,
}

impl MotionMonitor {
    /// Creates a monitor polling `reader` every `interval`.
    ///
    /// If the reader's timeout is not shorter than the interval it is
    /// lowered to half the interval.
    #[must_use]
    pub fn new(reader: PinReader, interval: PollInterval) -> Self {
        let mut core = MonitorCore::new(reader, false);
        let reader = core.reader_mut();
        if interval.check_timeout(reader.timeout()).is_err() {
            let timeout = interval.default_timeout();
            tracing::debug!(
                pin = %reader.handle(),
                ?timeout,
                "Lowering hardware timeout below polling interval"
            );
            reader.set_timeout(timeout);
        }
        Self {
            core,
            interval,
            registry: Arc::new(CallbackRegistry::new()),
            bus: EventBus::new(),
        }
    }

    /// Claims the configured pin on `chip` and builds a monitor for it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Value` if the configuration is invalid and
    /// `Error::Config` if the line is already claimed.
    pub fn from_config(chip: &GpioChip, config: &MonitorConfig) -> Result<Self, Error> {
        config.validate()?;
        let reader = chip
            .claim_handle(config.pin_handle()?)?
            .with_timeout(config.timeout()?);
        Ok(Self::new(reader, config.interval()?).with_initial_state(config.initial_state))
    }

    /// Claims `pin` on `chip` and starts monitoring it right away.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `Error::Value` for an invalid pin and `Error::Config` if the
    /// line is already claimed.
    pub fn start_with(
        chip: &GpioChip,
        pin: u8,
        interval: PollInterval,
    ) -> Result<MonitorHandle, Error> {
        Ok(Self::new(chip.claim(pin)?, interval).start())
    }

    /// Sets the stable value assumed before the first sample.
    #[must_use]
    pub fn with_initial_state(mut self, initial_state: bool) -> Self {
        self.core.set_initial_state(initial_state);
        self
    }

    /// Returns the line being monitored.
    #[must_use]
    pub fn handle(&self) -> &PinHandle {
        self.core.handle()
    }

    /// Returns the polling interval.
    #[must_use]
    pub fn interval(&self) -> PollInterval {
        self.interval
    }

    /// Starts the tick loop and the event dispatcher.
    ///
    /// The line is configured immediately; the first sample is taken one
    /// interval later. Must be called from within a tokio runtime.
    #[must_use = "dropping the handle stops the monitor"]
    pub fn start(self) -> MonitorHandle {
        let Self {
            core,
            interval,
            registry,
            bus,
        } = self;
        let pin = *core.handle();
        let shared = core.shared();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::task::spawn_blocking({
            let registry = Arc::clone(&registry);
            let bus = bus.clone();
            let shared = Arc::clone(&shared);
            move || run_dispatcher(rx, &registry, &bus, &shared)
        });
        let task = tokio::spawn(run_ticks(core, interval, tx));

        tracing::info!(pin = %pin, interval = %interval, "Motion monitor started");

        MonitorHandle {
            inner: Arc::new(HandleInner {
                pin,
                interval,
                registry,
                bus,
                shared,
                task: Mutex::new(Some(task)),
            }),
        }
    }
}

impl Subscribable for MotionMonitor {
    fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.registry.register(callback)
    }

    fn subscribe_fallible<F, E>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) -> Result<(), E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        self.registry.register_fallible(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.registry.unsubscribe(id)
    }
}

impl fmt::Debug for MotionMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionMonitor")
            .field("pin", self.core.handle())
            .field("interval", &self.interval)
            .field("subscribers", &self.registry.callback_count())
            .finish()
    }
}

struct HandleInner {
    pin: PinHandle,
    interval: PollInterval,
    registry: Arc<CallbackRegistry>,
    bus: EventBus,
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl HandleInner {
    fn stop(&self) {
        let first = self.shared.mark_stopped();
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }

        // Wait out an event that is being delivered right now, unless the
        // caller is one of its callbacks.
        let on_dispatcher =
            *self.shared.dispatcher_thread.lock() == Some(thread::current().id());
        if !on_dispatcher {
            drop(self.shared.dispatch_gate.lock());
        }

        if first {
            tracing::info!(pin = %self.pin, "Motion monitor stopped");
        }
    }
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Handle to a running motion monitor.
///
/// Clones share the same monitor. The monitor stops when [`stop`](Self::stop)
/// is called or when the last clone is dropped. A clone captured by one of
/// the monitor's own callbacks keeps it alive until `stop` is called.
#[derive(Clone)]
pub struct MonitorHandle {
    inner: Arc<HandleInner>,
}

impl MonitorHandle {
    /// Stops the monitor.
    ///
    /// After this returns no tick is scheduled and no event is delivered to
    /// any subscriber. A hardware call already in flight is left to finish
    /// on the blocking pool and its result is discarded. If an event is
    /// being delivered, this waits until its callbacks return, except when
    /// called from inside one of them.
    ///
    /// That wait blocks the calling thread for as long as the callbacks
    /// take. From async code prefer [`shutdown`](Self::shutdown), which
    /// waits on the blocking pool instead of a runtime worker.
    ///
    /// Safe to call repeatedly and from any thread.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// Stops the monitor without blocking the async runtime.
    ///
    /// Gives the same guarantees as [`stop`](Self::stop) once it resolves.
    pub async fn shutdown(&self) {
        let inner = Arc::clone(&self.inner);
        if let Err(e) = tokio::task::spawn_blocking(move || inner.stop()).await {
            tracing::warn!(pin = %self.inner.pin, error = %e, "Monitor shutdown task failed");
        }
    }

    /// Returns `true` until the monitor is stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.inner.shared.is_stopped()
    }

    /// Returns the line being monitored.
    #[must_use]
    pub fn pin(&self) -> &PinHandle {
        &self.inner.pin
    }

    /// Returns the polling interval.
    #[must_use]
    pub fn interval(&self) -> PollInterval {
        self.inner.interval
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> MonitorState {
        self.inner.shared.state()
    }

    /// Returns the last value reported to subscribers.
    #[must_use]
    pub fn stable_state(&self) -> bool {
        self.inner.shared.stable()
    }

    /// Returns a snapshot of the monitor's counters.
    #[must_use]
    pub fn stats(&self) -> MonitorStats {
        self.inner.shared.stats()
    }

    /// Returns a receiver for change events, for async consumers.
    ///
    /// Receivers see each event after the callbacks have run.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<ChangeEvent> {
        self.inner.bus.subscribe()
    }
}

impl Subscribable for MonitorHandle {
    fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.inner.registry.register(callback)
    }

    fn subscribe_fallible<F, E>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) -> Result<(), E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        self.inner.registry.register_fallible(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.registry.unsubscribe(id)
    }
}

impl fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorHandle")
            .field("pin", &self.inner.pin)
            .field("state", &self.state())
            .field("stable_state", &self.stable_state())
            .finish_non_exhaustive()
    }
}

/// Drives the core on the polling interval until stopped.
async fn run_ticks(
    mut core: MonitorCore,
    interval: PollInterval,
    events: mpsc::UnboundedSender<ChangeEvent>,
) {
    let shared = core.shared();
    // A failed initial configure leaves the core unconfigured; the first
    // tick retries it.
    let _ = core.arm().await;

    let period = interval.as_duration();
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if shared.is_stopped() {
            break;
        }
        if let TickOutcome::Changed(event) = core.tick().await {
            // Drop a sample that resolved after a stop.
            if shared.is_stopped() {
                break;
            }
            let pending = shared.stats.enqueue();
            if pending % BACKLOG_WARNING == 0 {
                tracing::warn!(
                    pin = event.pin(),
                    pending,
                    "Subscribers are falling behind, change events are queueing"
                );
            }
            if events.send(event).is_err() {
                break;
            }
        }
    }
    core.mark_stopped();
}

/// Delivers events in order until the tick loop goes away or the monitor
/// is stopped.
fn run_dispatcher(
    mut events: mpsc::UnboundedReceiver<ChangeEvent>,
    registry: &CallbackRegistry,
    bus: &EventBus,
    shared: &Shared,
) {
    *shared.dispatcher_thread.lock() = Some(thread::current().id());

    while let Some(event) = events.blocking_recv() {
        let _gate = shared.dispatch_gate.lock();
        if shared.is_stopped() {
            break;
        }

        let report = registry.dispatch(&event);
        for failure in &report.failures {
            tracing::warn!(pin = event.pin(), error = %failure, "Subscriber failed");
        }
        StatsCounters::add(
            &shared.stats.callback_failures,
            report.failures.len() as u64,
        );
        bus.publish(event);
        shared.stats.dequeue();
    }

    *shared.dispatcher_thread.lock() = None;
}
