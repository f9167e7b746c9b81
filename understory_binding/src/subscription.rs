// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Disposable subscriptions.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use understory_property::ChangeSubscription;

/// Handle that keeps an observable subscription alive.
///
/// [`dispose`](Self::dispose) stops delivery immediately and is idempotent.
/// Dropping the handle disposes it, so store it for as long as values should
/// keep flowing.
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use understory_binding::Subscription;
///
/// let released = Rc::new(Cell::new(0));
/// let counter = released.clone();
/// let mut sub = Subscription::new(move || counter.set(counter.get() + 1));
/// sub.dispose();
/// sub.dispose();
/// drop(sub);
/// assert_eq!(released.get(), 1);
/// ```
#[must_use = "dropping a Subscription disposes it"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Creates a subscription that runs `teardown` once when disposed.
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A subscription with nothing to release.
    pub fn empty() -> Self {
        Self { teardown: None }
    }

    /// Combines several subscriptions into one, disposed in order.
    pub fn from_many(subscriptions: impl IntoIterator<Item = Self>) -> Self {
        let mut subscriptions: Vec<Self> = subscriptions.into_iter().collect();
        Self::new(move || {
            for subscription in &mut subscriptions {
                subscription.dispose();
            }
        })
    }

    /// Releases the subscription. Later calls do nothing.
    pub fn dispose(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }

    /// Returns `true` once disposed (or if created with [`empty`](Self::empty)).
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.teardown.is_none()
    }
}

impl From<ChangeSubscription> for Subscription {
    fn from(mut subscription: ChangeSubscription) -> Self {
        Self::new(move || subscription.dispose())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
