// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GPIO chip: a backend plus its numbering scheme and line claims.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use super::PinReader;
use crate::error::{ConfigError, Error};
use crate::gpio::GpioBackend;
use crate::types::{PinHandle, PinNumbering};

/// Claimed lines and the lock serializing hardware calls on each line.
///
/// A line's lock outlives its readers, so a call abandoned by a dropped
/// reader still excludes the calls of the next one.
#[derive(Debug, Default)]
pub(super) struct LineTable {
    claimed: HashSet<u8>,
    locks: HashMap<u8, Arc<Mutex<()>>>,
}

impl LineTable {
    fn claim(&mut self, line: u8) -> Option<Arc<Mutex<()>>> {
        if !self.claimed.insert(line) {
            return None;
        }
        Some(Arc::clone(self.locks.entry(line).or_default()))
    }

    pub(super) fn unclaim(&mut self, line: u8) {
        self.claimed.remove(&line);
    }

    fn is_claimed(&self, line: u8) -> bool {
        self.claimed.contains(&line)
    }
}

/// Entry point for claiming input lines on one GPIO backend.
///
/// The numbering scheme is fixed when the chip is created instead of being
/// set process-wide. Each line can be held by at most one [`PinReader`] at
/// a time; dropping the reader returns the line to the chip once its last
/// hardware call has finished.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use dakota_motion::gpio::MockGpio;
/// use dakota_motion::reader::GpioChip;
/// use dakota_motion::types::PinNumbering;
///
/// let chip = GpioChip::new(Arc::new(MockGpio::new()), PinNumbering::Board);
///
/// let reader = chip.claim(11).unwrap();
/// assert_eq!(reader.handle().line(), 17);
///
/// // Board pin 11 is GPIO17, already held by `reader`.
/// assert!(chip.claim(11).is_err());
///
/// drop(reader);
/// assert!(chip.claim(11).is_ok());
/// ```
#[derive(Clone)]
pub struct GpioChip {
    backend: Arc<dyn GpioBackend>,
    numbering: PinNumbering,
    lines: Arc<Mutex<LineTable>>,
}

impl GpioChip {
    /// Creates a chip over `backend` using the given numbering scheme.
    #[must_use]
    pub fn new(backend: Arc<dyn GpioBackend>, numbering: PinNumbering) -> Self {
        Self {
            backend,
            numbering,
            lines: Arc::new(Mutex::new(LineTable::default())),
        }
    }

    /// Creates a chip that interprets pin numbers as BCM lines.
    #[must_use]
    pub fn bcm(backend: Arc<dyn GpioBackend>) -> Self {
        Self::new(backend, PinNumbering::Bcm)
    }

    /// Returns the numbering scheme used by [`claim`](Self::claim).
    #[must_use]
    pub fn numbering(&self) -> PinNumbering {
        self.numbering
    }

    /// Claims a pin with the default electrical settings.
    ///
    /// # Errors
    ///
    /// Returns `Error::Value` if the pin does not exist under this chip's
    /// numbering, and `Error::Config` with [`ConfigError::AlreadyClaimed`]
    /// if another reader holds the line.
    pub fn claim(&self, pin: u8) -> Result<PinReader, Error> {
        let handle = PinHandle::new(pin, self.numbering)?;
        Ok(self.claim_handle(handle)?)
    }

    /// Claims the line described by `handle`.
    ///
    /// No hardware call is made; the line is configured by
    /// [`PinReader::configure`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AlreadyClaimed`] if another reader holds the
    /// line.
    pub fn claim_handle(&self, handle: PinHandle) -> Result<PinReader, ConfigError> {
        let Some(line_lock) = self.lines.lock().claim(handle.line()) else {
            return Err(ConfigError::AlreadyClaimed(handle.line()));
        };
        tracing::debug!(pin = %handle, "Claimed GPIO line");
        Ok(PinReader::new(
            Arc::clone(&self.backend),
            handle,
            Arc::clone(&self.lines),
            line_lock,
        ))
    }

    /// Returns `true` if a reader currently holds the BCM line.
    #[must_use]
    pub fn is_claimed(&self, line: u8) -> bool {
        self.lines.lock().is_claimed(line)
    }
}

impl std::fmt::Debug for GpioChip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpioChip")
            .field("numbering", &self.numbering)
            .field("claimed", &self.lines.lock().claimed.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReadError, ValueError};
    use crate::gpio::MockGpio;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::time::Duration;

    /// Backend whose configure calls are slow and that records overlaps.
    #[derive(Default)]
    struct OverlapGpio {
        active: AtomicU32,
        max_active: AtomicU32,
        released_while_busy: AtomicBool,
    }

    impl GpioBackend for OverlapGpio {
        fn configure(&self, _handle: &PinHandle) -> Result<(), ConfigError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(150));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }

        fn read(&self, _line: u8) -> Result<bool, ReadError> {
            Ok(false)
        }

        fn release(&self, _line: u8) {
            if self.active.load(Ordering::SeqCst) > 0 {
                self.released_while_busy.store(true, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn claim_is_exclusive_per_line() {
        let chip = GpioChip::bcm(Arc::new(MockGpio::new()));
        let _reader = chip.claim(17).unwrap();

        let err = chip.claim(17).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::AlreadyClaimed(17))));
        assert!(chip.claim(27).is_ok());
    }

    #[test]
    fn clones_share_claims() {
        let chip = GpioChip::bcm(Arc::new(MockGpio::new()));
        let other = chip.clone();
        let _reader = chip.claim(4).unwrap();
        assert!(other.is_claimed(4));
        assert!(other.claim(4).is_err());
    }

    #[test]
    fn drop_releases_claim_and_line() {
        let gpio = Arc::new(MockGpio::new());
        let chip = GpioChip::bcm(gpio.clone());
        let reader = chip.claim(4).unwrap();
        drop(reader);
        assert!(!chip.is_claimed(4));
        assert_eq!(gpio.release_calls(), 1);
    }

    #[test]
    fn claim_validates_pin_number() {
        let chip = GpioChip::new(Arc::new(MockGpio::new()), PinNumbering::Board);
        let err = chip.claim(6).unwrap_err();
        assert!(matches!(err, Error::Value(ValueError::NotAGpioPin(6))));
    }

    #[test]
    fn numbering_schemes_share_lines() {
        let chip = GpioChip::bcm(Arc::new(MockGpio::new()));
        let _reader = chip.claim(17).unwrap();
        let board = PinHandle::new(11, PinNumbering::Board).unwrap();
        assert_eq!(
            chip.claim_handle(board).unwrap_err(),
            ConfigError::AlreadyClaimed(17)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn abandoned_call_blocks_next_reader() {
        let gpio = Arc::new(OverlapGpio::default());
        let chip = GpioChip::bcm(gpio.clone());

        let reader = chip
            .claim(17)
            .unwrap()
            .with_timeout(Duration::from_millis(20));
        assert!(matches!(
            reader.configure().await,
            Err(ConfigError::Timeout { line: 17, .. })
        ));
        drop(reader);

        // The line comes back only after the abandoned call returns.
        assert!(chip.is_claimed(17));
        for _ in 0..100 {
            if !chip.is_claimed(17) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!chip.is_claimed(17));

        let reader = chip.claim(17).unwrap();
        reader.configure().await.unwrap();

        assert_eq!(gpio.max_active.load(Ordering::SeqCst), 1);
        assert!(!gpio.released_while_busy.load(Ordering::SeqCst));
    }
}
