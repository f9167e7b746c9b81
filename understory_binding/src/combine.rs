// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Combine-latest operators.
//!
//! Both operators keep only the most recent value of each input, emit nothing
//! until every input has produced a value, and then emit on every input
//! change. Per-subscriber state lives behind a `RefCell` that is released
//! before the downstream observer runs, so re-entrant emissions are safe.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::observable::{Observable, Observer};
use crate::subscription::Subscription;

/// Combines two sequences into a sequence of pairs.
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use understory_binding::{Publisher, combine_latest2};
///
/// let extent = Publisher::new();
/// let viewport = Publisher::new();
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = seen.clone();
/// let _sub = combine_latest2(&extent.observe(), &viewport.observe())
///     .subscribe(move |pair| sink.borrow_mut().push(pair));
///
/// extent.publish(500.0);
/// assert!(seen.borrow().is_empty());
/// viewport.publish(100.0);
/// extent.publish(400.0);
/// assert_eq!(*seen.borrow(), vec![(500.0, 100.0), (400.0, 100.0)]);
/// ```
pub fn combine_latest2<A, B>(first: &Observable<A>, second: &Observable<B>) -> Observable<(A, B)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    let first = first.clone();
    let second = second.clone();
    Observable::new(move |observer: Observer<(A, B)>| {
        let latest: Rc<RefCell<(Option<A>, Option<B>)>> = Rc::new(RefCell::new((None, None)));

        let on_first = {
            let latest = latest.clone();
            let observer = observer.clone();
            first.subscribe(move |value| {
                let ready = {
                    let mut latest = latest.borrow_mut();
                    latest.0 = Some(value);
                    pair(&latest)
                };
                if let Some(ready) = ready {
                    observer(ready);
                }
            })
        };
        let on_second = second.subscribe(move |value| {
            let ready = {
                let mut latest = latest.borrow_mut();
                latest.1 = Some(value);
                pair(&latest)
            };
            if let Some(ready) = ready {
                observer(ready);
            }
        });

        Subscription::from_many([on_first, on_second])
    })
}

fn pair<A: Clone, B: Clone>(latest: &(Option<A>, Option<B>)) -> Option<(A, B)> {
    match latest {
        (Some(a), Some(b)) => Some((a.clone(), b.clone())),
        _ => None,
    }
}

/// Combines any number of same-typed sequences into a sequence of vectors,
/// one element per input in input order.
///
/// An empty input list never emits.
pub fn combine_latest<T: Clone + 'static>(sources: Vec<Observable<T>>) -> Observable<Vec<T>> {
    Observable::new(move |observer: Observer<Vec<T>>| {
        if sources.is_empty() {
            return Subscription::empty();
        }
        let latest: Rc<RefCell<Vec<Option<T>>>> =
            Rc::new(RefCell::new((0..sources.len()).map(|_| None).collect()));
        let subscriptions: Vec<Subscription> = sources
            .iter()
            .enumerate()
            .map(|(index, source)| {
                let latest = latest.clone();
                let observer = observer.clone();
                source.subscribe(move |value| {
                    let ready: Option<Vec<T>> = {
                        let mut latest = latest.borrow_mut();
                        latest[index] = Some(value);
                        latest.iter().cloned().collect()
                    };
                    if let Some(ready) = ready {
                        observer(ready);
                    }
                })
            })
            .collect();
        Subscription::from_many(subscriptions)
    })
}
