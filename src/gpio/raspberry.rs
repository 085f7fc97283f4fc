// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raspberry Pi GPIO backend built on `rppal`.

use std::collections::HashMap;

use parking_lot::Mutex;
use rppal::gpio::{Gpio, InputPin, Trigger};

use super::GpioBackend;
use crate::error::{ConfigError, ReadError};
use crate::types::{Edge, PinHandle, Pull};

/// GPIO backend for the Raspberry Pi 40-pin header.
///
/// The GPIO peripheral is opened lazily on the first `configure`, so a
/// backend can be created before the device node is accessible (for
/// example right after boot) and recover once it is.
#[derive(Default)]
pub struct RppalGpio {
    chip: Mutex<Option<Gpio>>,
    pins: Mutex<HashMap<u8, InputPin>>,
}

impl RppalGpio {
    /// Creates a backend; no hardware is touched until a line is configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn open_chip(&self, line: u8) -> Result<Gpio, ConfigError> {
        let mut chip = self.chip.lock();
        if let Some(gpio) = chip.as_ref() {
            return Ok(gpio.clone());
        }
        let gpio = Gpio::new().map_err(|e| map_error(line, e))?;
        *chip = Some(gpio.clone());
        Ok(gpio)
    }
}

impl GpioBackend for RppalGpio {
    fn configure(&self, handle: &PinHandle) -> Result<(), ConfigError> {
        let line = handle.line();
        let gpio = self.open_chip(line)?;

        // rppal refuses to hand out a line that is still held, so the
        // previous configuration has to go first.
        self.pins.lock().remove(&line);

        let pin = gpio.get(line).map_err(|e| map_error(line, e))?;
        let mut input = match handle.pull() {
            Pull::Off => pin.into_input(),
            Pull::Down => pin.into_input_pulldown(),
            Pull::Up => pin.into_input_pullup(),
        };

        let edge = match handle.edge() {
            Edge::None => input.clear_interrupt(),
            Edge::Rising => input.set_interrupt(Trigger::RisingEdge, None),
            Edge::Falling => input.set_interrupt(Trigger::FallingEdge, None),
            Edge::Both => input.set_interrupt(Trigger::Both, None),
        };
        edge.map_err(|e| map_error(line, e))?;

        self.pins.lock().insert(line, input);
        tracing::debug!(line, edge = %handle.edge(), pull = %handle.pull(), "Configured GPIO line");
        Ok(())
    }

    fn read(&self, line: u8) -> Result<bool, ReadError> {
        self.pins
            .lock()
            .get(&line)
            .map(InputPin::is_high)
            .ok_or(ReadError::NotConfigured(line))
    }

    fn release(&self, line: u8) {
        self.pins.lock().remove(&line);
    }
}

impl std::fmt::Debug for RppalGpio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RppalGpio")
            .field("open", &self.chip.lock().is_some())
            .field("lines", &self.pins.lock().keys().collect::<Vec<_>>())
            .finish()
    }
}

fn map_error(line: u8, error: rppal::gpio::Error) -> ConfigError {
    use rppal::gpio::Error;

    match error {
        Error::PermissionDenied(message) => ConfigError::PermissionDenied { line, message },
        Error::PinUsed(_) | Error::PinNotAvailable(_) => ConfigError::PinUnavailable(line),
        other => ConfigError::Hardware {
            line,
            message: other.to_string(),
        },
    }
}
