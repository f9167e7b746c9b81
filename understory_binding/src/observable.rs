// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Push-based observable sequences.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use crate::subscription::Subscription;

/// Callback receiving each value an [`Observable`] emits.
pub type Observer<T> = Rc<dyn Fn(T)>;

/// A lazy, push-based, synchronous sequence of values.
///
/// Nothing happens until [`subscribe`](Self::subscribe) is called; each
/// subscription is independent and receives values from the moment it is
/// made. Sequences never complete.
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use understory_binding::Publisher;
///
/// let widths = Publisher::new();
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = seen.clone();
/// let _sub = widths
///     .observe()
///     .select(|w: f64| w * 2.0)
///     .start_with(0.0)
///     .subscribe(move |v| sink.borrow_mut().push(v));
///
/// widths.publish(4.0);
/// assert_eq!(*seen.borrow(), vec![0.0, 8.0]);
/// ```
pub struct Observable<T> {
    on_subscribe: Rc<dyn Fn(Observer<T>) -> Subscription>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            on_subscribe: self.on_subscribe.clone(),
        }
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("item", &core::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Creates an observable from its subscribe function.
    ///
    /// `on_subscribe` is called once per subscriber with that subscriber's
    /// observer and returns what to release on disposal.
    pub fn new(on_subscribe: impl Fn(Observer<T>) -> Subscription + 'static) -> Self {
        Self {
            on_subscribe: Rc::new(on_subscribe),
        }
    }

    /// A sequence that never emits.
    pub fn never() -> Self {
        Self::new(|_| Subscription::empty())
    }

    /// Subscribes `observer` to this sequence.
    pub fn subscribe(&self, observer: impl Fn(T) + 'static) -> Subscription {
        (self.on_subscribe)(Rc::new(observer))
    }

    /// Maps every value through `f`.
    ///
    /// `f` is called exactly once per source value.
    pub fn select<U, F>(&self, f: F) -> Observable<U>
    where
        U: Clone + 'static,
        F: Fn(T) -> U + 'static,
    {
        let source = self.clone();
        let f = Rc::new(f);
        Observable::new(move |observer: Observer<U>| {
            let f = f.clone();
            source.subscribe(move |value| observer(f(value)))
        })
    }

    /// Emits `value` to each new subscriber, then the source's values.
    pub fn start_with(&self, value: T) -> Self {
        let source = self.clone();
        Self::new(move |observer: Observer<T>| {
            observer(value.clone());
            source.subscribe(move |v| observer(v))
        })
    }

    /// Drops values equal to the previous one delivered to the same subscriber.
    pub fn distinct_until_changed(&self) -> Self
    where
        T: PartialEq,
    {
        let source = self.clone();
        Self::new(move |observer: Observer<T>| {
            let last = Rc::new(RefCell::new(None::<T>));
            source.subscribe(move |value| {
                let fresh = {
                    let mut last = last.borrow_mut();
                    if last.as_ref() == Some(&value) {
                        false
                    } else {
                        *last = Some(value.clone());
                        true
                    }
                };
                if fresh {
                    observer(value);
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::Publisher;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::Cell;

    fn collect<T: Clone + 'static>(source: &Observable<T>) -> (Rc<RefCell<Vec<T>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let sub = source.subscribe(move |v| sink.borrow_mut().push(v));
        (seen, sub)
    }

    #[test]
    fn select_maps_each_value_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let source = Publisher::new();
        let mapped = source.observe().select(move |v: i32| {
            counter.set(counter.get() + 1);
            v * 10
        });
        let (seen, _sub) = collect(&mapped);
        source.publish(1);
        source.publish(2);
        assert_eq!(*seen.borrow(), vec![10, 20]);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn start_with_emits_per_subscriber() {
        let source = Publisher::new();
        let seeded = source.observe().start_with(7);
        let (first, _a) = collect(&seeded);
        source.publish(8);
        let (second, _b) = collect(&seeded);
        assert_eq!(*first.borrow(), vec![7, 8]);
        assert_eq!(*second.borrow(), vec![7]);
    }

    #[test]
    fn distinct_until_changed_skips_repeats() {
        let source = Publisher::new();
        let (seen, _sub) = collect(&source.observe().distinct_until_changed());
        for v in [true, true, false, false, true] {
            source.publish(v);
        }
        assert_eq!(*seen.borrow(), vec![true, false, true]);
    }

    #[test]
    fn disposal_stops_delivery() {
        let source = Publisher::new();
        let (seen, mut sub) = collect(&source.observe().select(|v: u8| v + 1));
        source.publish(1);
        sub.dispose();
        source.publish(2);
        assert_eq!(*seen.borrow(), vec![2]);
        assert_eq!(source.observer_count(), 0);
    }

    #[test]
    fn never_emits_nothing() {
        let (seen, sub) = collect(&Observable::<u8>::never());
        assert!(seen.borrow().is_empty());
        assert!(sub.is_disposed());
    }
}
