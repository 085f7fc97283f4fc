// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory GPIO backend.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::GpioBackend;
use crate::error::{ConfigError, ReadError};
use crate::types::PinHandle;

#[derive(Debug, Default)]
struct Line {
    configured: Option<PinHandle>,
    level: bool,
    script: VecDeque<Result<bool, ReadError>>,
    config_failures: VecDeque<ConfigError>,
}

/// Scripted GPIO backend that never touches hardware.
///
/// Each line has a level that reads return once its script of queued
/// results is exhausted. Configure failures and call delays can be
/// injected to exercise the monitor's recovery path.
///
/// # Examples
///
/// ```
/// use dakota_motion::gpio::{GpioBackend, MockGpio};
/// use dakota_motion::types::PinHandle;
///
/// let gpio = MockGpio::new();
/// let handle = PinHandle::bcm(17).unwrap();
///
/// gpio.push_reads(17, [false, true]);
/// gpio.configure(&handle).unwrap();
///
/// assert_eq!(gpio.read(17), Ok(false));
/// assert_eq!(gpio.read(17), Ok(true));
/// assert_eq!(gpio.configure_calls(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockGpio {
    lines: Mutex<HashMap<u8, Line>>,
    read_delay: Mutex<Option<Duration>>,
    configure_delay: Mutex<Option<Duration>>,
    configure_calls: AtomicU32,
    read_calls: AtomicU32,
    release_calls: AtomicU32,
}

impl MockGpio {
    /// Creates a backend with every line low and unconfigured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level returned once the line's script is exhausted.
    pub fn set_level(&self, line: u8, level: bool) {
        self.lines.lock().entry(line).or_default().level = level;
    }

    /// Queues successful reads for the line.
    ///
    /// The last queued value also becomes the line's resting level.
    pub fn push_reads(&self, line: u8, values: impl IntoIterator<Item = bool>) {
        let mut lines = self.lines.lock();
        let entry = lines.entry(line).or_default();
        for value in values {
            entry.script.push_back(Ok(value));
            entry.level = value;
        }
    }

    /// Queues a failed read for the line.
    pub fn push_read_error(&self, line: u8, error: ReadError) {
        self.lines
            .lock()
            .entry(line)
            .or_default()
            .script
            .push_back(Err(error));
    }

    /// Makes the next `count` configure calls for the line fail.
    pub fn fail_configures(&self, line: u8, count: usize) {
        let mut lines = self.lines.lock();
        let entry = lines.entry(line).or_default();
        for _ in 0..count {
            entry.config_failures.push_back(ConfigError::Hardware {
                line,
                message: "mock configure failure".to_string(),
            });
        }
    }

    /// Makes the next configure call for the line fail with `error`.
    pub fn push_configure_error(&self, line: u8, error: ConfigError) {
        self.lines
            .lock()
            .entry(line)
            .or_default()
            .config_failures
            .push_back(error);
    }

    /// Makes every read block for `delay` before returning.
    pub fn set_read_delay(&self, delay: Option<Duration>) {
        *self.read_delay.lock() = delay;
    }

    /// Makes every configure call block for `delay` before returning.
    pub fn set_configure_delay(&self, delay: Option<Duration>) {
        *self.configure_delay.lock() = delay;
    }

    /// Returns the current configuration of the line, if any.
    #[must_use]
    pub fn configuration(&self, line: u8) -> Option<PinHandle> {
        self.lines.lock().get(&line).and_then(|l| l.configured)
    }

    /// Returns the number of configure calls across all lines.
    #[must_use]
    pub fn configure_calls(&self) -> u32 {
        self.configure_calls.load(Ordering::SeqCst)
    }

    /// Returns the number of read calls across all lines.
    #[must_use]
    pub fn read_calls(&self) -> u32 {
        self.read_calls.load(Ordering::SeqCst)
    }

    /// Returns the number of release calls across all lines.
    #[must_use]
    pub fn release_calls(&self) -> u32 {
        self.release_calls.load(Ordering::SeqCst)
    }
}

impl GpioBackend for MockGpio {
    fn configure(&self, handle: &PinHandle) -> Result<(), ConfigError> {
        self.configure_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.configure_delay.lock();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let mut lines = self.lines.lock();
        let line = lines.entry(handle.line()).or_default();
        if let Some(err) = line.config_failures.pop_front() {
            line.configured = None;
            return Err(err);
        }
        line.configured = Some(*handle);
        Ok(())
    }

    fn read(&self, line: u8) -> Result<bool, ReadError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.read_delay.lock();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let mut lines = self.lines.lock();
        let entry = lines.entry(line).or_default();
        if entry.configured.is_none() {
            return Err(ReadError::NotConfigured(line));
        }
        entry.script.pop_front().unwrap_or(Ok(entry.level))
    }

    fn release(&self, line: u8) {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(entry) = self.lines.lock().get_mut(&line) {
            entry.configured = None;
        }
    }
}
