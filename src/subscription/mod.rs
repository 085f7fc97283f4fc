// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription system for change events.
//!
//! The subscription system consists of:
//!
//! - [`SubscriptionId`] - A unique identifier for a subscription, used to unsubscribe
//! - [`CallbackRegistry`] - Ordered registry that stores callbacks and dispatches events
//! - [`Subscribable`] - Trait for types that accept subscribers
//!
//! Any host-side consumer (a home-automation characteristic updater, a log
//! sink, ...) is modelled as an opaque `Fn(&ChangeEvent)` callback.

mod callback;
mod subscribable;

pub use callback::{CallbackRegistry, DispatchReport, SubscriptionId};
pub use subscribable::Subscribable;
