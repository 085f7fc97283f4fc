// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Exclusive, time-bounded access to one input line.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::RawReading;
use super::chip::LineTable;
use crate::error::{ConfigError, ReadError};
use crate::gpio::GpioBackend;
use crate::types::PinHandle;

/// Hardware call timeout used until the monitor sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Owns one claimed input line and performs configure and read calls on it.
///
/// Every hardware call runs on tokio's blocking pool and is bounded by the
/// reader's timeout. When the timeout elapses the call keeps running to
/// completion in the background and its result is discarded; calls on the
/// same line are serialized so a late call never overlaps a new one.
///
/// Readers are created by [`GpioChip::claim`](super::GpioChip::claim).
pub struct PinReader {
    backend: Arc<dyn GpioBackend>,
    handle: PinHandle,
    timeout: Duration,
    configured: AtomicBool,
    lines: Arc<Mutex<LineTable>>,
    line_lock: Arc<Mutex<()>>,
}

impl PinReader {
    pub(super) fn new(
        backend: Arc<dyn GpioBackend>,
        handle: PinHandle,
        lines: Arc<Mutex<LineTable>>,
        line_lock: Arc<Mutex<()>>,
    ) -> Self {
        Self {
            backend,
            handle,
            timeout: DEFAULT_TIMEOUT,
            configured: AtomicBool::new(false),
            lines,
            line_lock,
        }
    }

    /// Returns the line this reader owns.
    #[must_use]
    pub fn handle(&self) -> &PinHandle {
        &self.handle
    }

    /// Returns the timeout applied to each hardware call.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sets the timeout applied to each hardware call.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Returns `true` if the last configure call succeeded.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::Acquire)
    }

    /// Configures (or re-arms) the line.
    ///
    /// Idempotent: calling it again replaces the previous configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the backend rejects the configuration or
    /// the call does not finish within the timeout.
    pub async fn configure(&self) -> Result<(), ConfigError> {
        let line = self.handle.line();
        tracing::info!(pin = %self.handle, "Setting up GPIO pin");

        let backend = Arc::clone(&self.backend);
        let lock = Arc::clone(&self.line_lock);
        let handle = self.handle;
        let task = tokio::task::spawn_blocking(move || {
            let _guard = lock.lock();
            backend.configure(&handle)
        });

        let result = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(ConfigError::Hardware {
                line,
                message: join_error.to_string(),
            }),
            Err(_) => Err(ConfigError::Timeout {
                line,
                timeout_ms: millis(self.timeout),
            }),
        };

        self.configured.store(result.is_ok(), Ordering::Release);
        result
    }

    /// Samples the line once.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::NotConfigured`] without touching the hardware if
    /// the line has not been configured successfully, or another
    /// `ReadError` if the sample fails or times out.
    pub async fn read(&self) -> Result<bool, ReadError> {
        let line = self.handle.line();
        if !self.is_configured() {
            return Err(ReadError::NotConfigured(line));
        }

        let backend = Arc::clone(&self.backend);
        let lock = Arc::clone(&self.line_lock);
        let task = tokio::task::spawn_blocking(move || {
            let _guard = lock.lock();
            backend.read(line)
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(ReadError::Io {
                line,
                message: join_error.to_string(),
            }),
            Err(_) => Err(ReadError::Timeout {
                line,
                timeout_ms: millis(self.timeout),
            }),
        }
    }

    /// Samples the line once and stamps the result.
    pub async fn sample(&self) -> RawReading {
        let result = self.read().await;
        RawReading::new(self.handle.line(), result)
    }
}

impl Drop for PinReader {
    fn drop(&mut self) {
        if let Some(_guard) = self.line_lock.try_lock() {
            release_line(self.backend.as_ref(), &self.lines, &self.handle);
            return;
        }

        // A timed-out call still holds the line; release it once that
        // call returns.
        tracing::debug!(pin = %self.handle, "GPIO line busy, deferring release");
        let backend = Arc::clone(&self.backend);
        let lines = Arc::clone(&self.lines);
        let line_lock = Arc::clone(&self.line_lock);
        let handle = self.handle;
        let release = move || {
            let _guard = line_lock.lock();
            release_line(backend.as_ref(), &lines, &handle);
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(release);
            }
            Err(_) => {
                std::thread::spawn(release);
            }
        }
    }
}

/// Releases the line in the backend and returns it to the chip. The
/// caller holds the line lock.
fn release_line(backend: &dyn GpioBackend, lines: &Mutex<LineTable>, handle: &PinHandle) {
    backend.release(handle.line());
    lines.lock().unclaim(handle.line());
    tracing::debug!(pin = %handle, "Released GPIO line");
}

impl std::fmt::Debug for PinReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinReader")
            .field("handle", &self.handle)
            .field("timeout", &self.timeout)
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::MockGpio;
    use crate::reader::GpioChip;
    use crate::types::{Edge, Pull};

    fn setup(pin: u8) -> (Arc<MockGpio>, PinReader) {
        let gpio = Arc::new(MockGpio::new());
        let chip = GpioChip::bcm(gpio.clone());
        let reader = chip.claim(pin).unwrap();
        (gpio, reader)
    }

    #[tokio::test]
    async fn read_before_configure_is_rejected() {
        let (gpio, reader) = setup(17);
        assert_eq!(reader.read().await, Err(ReadError::NotConfigured(17)));
        assert_eq!(gpio.read_calls(), 0);
    }

    #[tokio::test]
    async fn configure_applies_defaults() {
        let (gpio, reader) = setup(17);
        reader.configure().await.unwrap();

        let applied = gpio.configuration(17).unwrap();
        assert_eq!(applied.edge(), Edge::Both);
        assert_eq!(applied.pull(), Pull::Down);
        assert!(reader.is_configured());
    }

    #[tokio::test]
    async fn configure_is_idempotent() {
        let (gpio, reader) = setup(17);
        reader.configure().await.unwrap();
        let once = gpio.configuration(17);
        reader.configure().await.unwrap();

        assert_eq!(gpio.configuration(17), once);
        assert!(reader.is_configured());
        assert_eq!(gpio.configure_calls(), 2);
    }

    #[tokio::test]
    async fn failed_configure_disarms() {
        let (gpio, reader) = setup(17);
        reader.configure().await.unwrap();
        gpio.fail_configures(17, 1);

        assert!(reader.configure().await.is_err());
        assert!(!reader.is_configured());
        assert_eq!(reader.read().await, Err(ReadError::NotConfigured(17)));
    }

    #[tokio::test]
    async fn read_returns_level() {
        let (gpio, reader) = setup(17);
        gpio.push_reads(17, [true, false]);
        reader.configure().await.unwrap();

        assert_eq!(reader.read().await, Ok(true));
        let sample = reader.sample().await;
        assert_eq!(sample.value(), Some(false));
    }

    #[tokio::test]
    async fn slow_read_times_out() {
        let (gpio, reader) = setup(17);
        let reader = reader.with_timeout(Duration::from_millis(20));
        reader.configure().await.unwrap();
        gpio.set_read_delay(Some(Duration::from_millis(200)));

        assert_eq!(
            reader.read().await,
            Err(ReadError::Timeout {
                line: 17,
                timeout_ms: 20,
            })
        );
    }

    #[tokio::test]
    async fn slow_configure_times_out() {
        let (gpio, reader) = setup(17);
        let reader = reader.with_timeout(Duration::from_millis(20));
        gpio.set_configure_delay(Some(Duration::from_millis(200)));

        assert!(matches!(
            reader.configure().await,
            Err(ConfigError::Timeout { line: 17, .. })
        ));
        assert!(!reader.is_configured());
    }
}
