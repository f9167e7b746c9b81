// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multicast value source.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use smallvec::SmallVec;

use crate::observable::{Observable, Observer};
use crate::subscription::Subscription;

struct Slot<T> {
    id: u64,
    active: Rc<Cell<bool>>,
    observer: Observer<T>,
}

struct Shared<T> {
    slots: RefCell<Vec<Slot<T>>>,
    next_id: Cell<u64>,
}

/// A hot source that pushes each published value to every current observer.
///
/// Observers are called in subscription order. One that is disposed while a
/// value is being delivered is skipped for the rest of that delivery.
pub struct Publisher<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Default for Publisher<T> {
    fn default() -> Self {
        Self {
            shared: Rc::new(Shared {
                slots: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }
}

impl<T> fmt::Debug for Publisher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("observers", &self.shared.slots.borrow().len())
            .finish()
    }
}

impl<T: Clone + 'static> Publisher<T> {
    /// Creates a publisher with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `value` to every observer.
    pub fn publish(&self, value: T) {
        let snapshot: SmallVec<[(Rc<Cell<bool>>, Observer<T>); 4]> = self
            .shared
            .slots
            .borrow()
            .iter()
            .map(|slot| (slot.active.clone(), slot.observer.clone()))
            .collect();
        for (active, observer) in snapshot {
            if active.get() {
                observer(value.clone());
            }
        }
    }

    /// Returns the number of live observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.shared.slots.borrow().len()
    }

    /// Returns an observable of future published values.
    #[must_use]
    pub fn observe(&self) -> Observable<T> {
        let shared = Rc::downgrade(&self.shared);
        Observable::new(move |observer| {
            let Some(live) = shared.upgrade() else {
                return Subscription::empty();
            };
            let id = live.next_id.get();
            live.next_id.set(id + 1);
            let active = Rc::new(Cell::new(true));
            live.slots.borrow_mut().push(Slot {
                id,
                active: active.clone(),
                observer,
            });
            let shared = Rc::downgrade(&live);
            Subscription::new(move || {
                active.set(false);
                if let Some(live) = shared.upgrade() {
                    live.slots.borrow_mut().retain(|slot| slot.id != id);
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn observers_called_in_subscription_order() {
        let publisher = Publisher::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let subs: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|name| {
                let log = log.clone();
                publisher
                    .observe()
                    .subscribe(move |v: i32| log.borrow_mut().push((name, v)))
            })
            .collect();
        publisher.publish(1);
        assert_eq!(*log.borrow(), vec![("a", 1), ("b", 1), ("c", 1)]);
        drop(subs);
        assert_eq!(publisher.observer_count(), 0);
    }

    #[test]
    fn observer_disposed_mid_delivery_is_skipped() {
        let publisher = Publisher::new();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(Cell::new(0));

        let slot = victim.clone();
        let _killer = publisher.observe().subscribe(move |_: u8| {
            if let Some(mut sub) = slot.borrow_mut().take() {
                sub.dispose();
            }
        });
        let counter = hits.clone();
        *victim.borrow_mut() = Some(
            publisher
                .observe()
                .subscribe(move |_| counter.set(counter.get() + 1)),
        );

        publisher.publish(0);
        assert_eq!(hits.get(), 0);
        assert_eq!(publisher.observer_count(), 1);
    }

    #[test]
    fn observing_a_dropped_publisher_is_inert() {
        let publisher = Publisher::<u8>::new();
        let stream = publisher.observe();
        drop(publisher);
        assert!(stream.subscribe(|_| {}).is_disposed());
    }
}
