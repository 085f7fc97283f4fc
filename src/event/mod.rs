// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change events and their async fan-out.
//!
//! A [`ChangeEvent`] is produced each time the debounced value of a pin
//! flips. Callback subscribers receive it through the
//! [`subscription`](crate::subscription) registry; async consumers can
//! receive the same stream from an [`EventBus`].

mod change_event;
mod event_bus;

pub use change_event::ChangeEvent;
pub use event_bus::EventBus;
