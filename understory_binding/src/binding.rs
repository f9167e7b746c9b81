// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property bindings.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use understory_property::{Property, PropertyError, PropertyObject, PropertyValue};

use crate::observable::Observable;
use crate::property::observe;
use crate::subscription::Subscription;

/// A live link driving one or more target properties.
///
/// Dropping the binding (or calling [`dispose`](Self::dispose)) stops
/// propagation. Write failures are logged and the most recent one is kept
/// for inspection.
#[must_use = "dropping a Binding disposes it"]
pub struct Binding {
    subscriptions: Vec<Subscription>,
    error: ErrorSlot,
}

type ErrorSlot = Rc<RefCell<Option<PropertyError>>>;

impl Binding {
    /// Stops propagation. Later calls do nothing.
    pub fn dispose(&mut self) {
        for subscription in &mut self.subscriptions {
            subscription.dispose();
        }
    }

    /// Returns `true` once disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.subscriptions.iter().all(Subscription::is_disposed)
    }

    /// Returns the most recent write failure, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<PropertyError> {
        self.error.borrow().clone()
    }

    /// Takes and clears the most recent write failure.
    pub fn take_error(&self) -> Option<PropertyError> {
        self.error.borrow_mut().take()
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("disposed", &self.is_disposed())
            .field("last_error", &self.error.borrow())
            .finish()
    }
}

/// Writes every value `source` emits into `property` on `target`.
///
/// `target` is held weakly. A failed write is logged with `tracing::warn!`
/// and kept on the binding; the binding stays active.
///
/// # Errors
///
/// - [`PropertyError::InvalidProperty`] if `property` cannot be used on `target`.
/// - Any error from a write made synchronously while subscribing (for
///   example, the first value of a `start_with` source). No binding is
///   left behind in that case.
pub fn bind<T: PropertyValue>(
    target: &PropertyObject,
    property: Property<T>,
    source: &Observable<T>,
) -> Result<Binding, PropertyError> {
    let error = Rc::new(RefCell::new(None));
    let subscription = bind_into(target, property, source, &error)?;
    Ok(Binding {
        subscriptions: vec![subscription],
        error,
    })
}

fn bind_into<T: PropertyValue>(
    target: &PropertyObject,
    property: Property<T>,
    source: &Observable<T>,
    error: &ErrorSlot,
) -> Result<Subscription, PropertyError> {
    target.check(property)?;
    let weak = target.downgrade();
    let slot = error.clone();
    let owner = target.owner_name();
    let subscription = source.subscribe(move |value: T| {
        let Some(target) = weak.upgrade() else {
            return;
        };
        tracing::trace!(owner, ?property, ?value, "binding propagates");
        if let Err(err) = target.set(property, value) {
            tracing::warn!(owner, %err, "binding failed to write its target");
            *slot.borrow_mut() = Some(err);
        }
    });
    let initial = error.borrow_mut().take();
    match initial {
        Some(err) => Err(err),
        None => Ok(subscription),
    }
}

/// Keeps `target`'s `target_property` equal to `source`'s `source_property`.
///
/// Only future changes of the source propagate; call sites that need the
/// target primed should write it first.
///
/// # Errors
///
/// [`PropertyError::InvalidProperty`] if either property cannot be used on
/// its object.
pub fn bind_one_way<T: PropertyValue>(
    source: &PropertyObject,
    source_property: Property<T>,
    target: &PropertyObject,
    target_property: Property<T>,
) -> Result<Binding, PropertyError> {
    bind(target, target_property, &observe(source, source_property)?)
}

/// Links two properties in both directions.
///
/// This is two independent one-way bindings, `a → b` then `b → a`. Loops
/// end because writing an equal value does not notify.
///
/// ```rust
/// use std::rc::Rc;
/// use understory_binding::bind_two_way;
/// use understory_property::{PropertyMetadata, PropertyObject, PropertyRegistry};
///
/// struct Slider;
///
/// let mut registry = PropertyRegistry::new();
/// let value = registry.register::<Slider, f64>("Value", PropertyMetadata::new(0.0));
/// let registry = Rc::new(registry);
/// let a = PropertyObject::new::<Slider>(registry.clone());
/// let b = PropertyObject::new::<Slider>(registry);
///
/// let _link = bind_two_way(&a, value, &b, value).unwrap();
/// a.set(value, 3.0).unwrap();
/// assert_eq!(b.get(value).unwrap(), 3.0);
/// b.set(value, 4.0).unwrap();
/// assert_eq!(a.get(value).unwrap(), 4.0);
/// ```
///
/// # Errors
///
/// [`PropertyError::InvalidProperty`] if either property cannot be used on
/// its object.
pub fn bind_two_way<T: PropertyValue>(
    a: &PropertyObject,
    a_property: Property<T>,
    b: &PropertyObject,
    b_property: Property<T>,
) -> Result<Binding, PropertyError> {
    let error = Rc::new(RefCell::new(None));
    let forward = bind_into(b, b_property, &observe(a, a_property)?, &error)?;
    let backward = bind_into(a, a_property, &observe(b, b_property)?, &error)?;
    Ok(Binding {
        subscriptions: vec![forward, backward],
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::Publisher;
    use understory_property::{
        CoerceError, PropertyMetadata, PropertyMetadataBuilder, PropertyRegistry,
    };

    struct Dial;

    struct Props {
        registry: Rc<PropertyRegistry>,
        level: Property<i32>,
        even: Property<i32>,
    }

    fn props() -> Props {
        let mut registry = PropertyRegistry::new();
        let level = registry.register::<Dial, i32>("Level", PropertyMetadata::new(0));
        let even = registry.register::<Dial, i32>(
            "Even",
            PropertyMetadataBuilder::new(0)
                .try_coerce(|_, v: i32| {
                    if v % 2 == 0 {
                        Ok(v)
                    } else {
                        Err(CoerceError::new("odd"))
                    }
                })
                .build(),
        );
        Props {
            registry: Rc::new(registry),
            level,
            even,
        }
    }

    fn dial(p: &Props) -> PropertyObject {
        PropertyObject::new::<Dial>(p.registry.clone())
    }

    #[test]
    fn bind_writes_each_emission() {
        let p = props();
        let target = dial(&p);
        let source = Publisher::new();
        let binding = bind(&target, p.level, &source.observe()).unwrap();
        source.publish(4);
        assert_eq!(target.get(p.level).unwrap(), 4);
        assert!(binding.last_error().is_none());
    }

    #[test]
    fn failed_writes_are_kept_not_swallowed() {
        let p = props();
        let target = dial(&p);
        let source = Publisher::new();
        let binding = bind(&target, p.even, &source.observe()).unwrap();
        source.publish(3);
        assert!(matches!(
            binding.last_error(),
            Some(PropertyError::Coercion { name: "Even", .. })
        ));
        assert_eq!(target.get(p.even).unwrap(), 0);

        source.publish(8);
        assert_eq!(target.get(p.even).unwrap(), 8);
        assert!(binding.take_error().is_some());
        assert!(binding.last_error().is_none());
    }

    #[test]
    fn initial_failure_is_returned() {
        let p = props();
        let target = dial(&p);
        let source = Publisher::new();
        let result = bind(&target, p.even, &source.observe().start_with(1));
        assert!(result.is_err());
        assert_eq!(source.observer_count(), 0);
    }

    #[test]
    fn dispose_is_immediate_and_idempotent() {
        let p = props();
        let target = dial(&p);
        let source = Publisher::new();
        let mut binding = bind(&target, p.level, &source.observe()).unwrap();
        binding.dispose();
        binding.dispose();
        assert!(binding.is_disposed());
        source.publish(9);
        assert_eq!(target.get(p.level).unwrap(), 0);
    }

    #[test]
    fn two_way_terminates_and_settles() {
        let p = props();
        let a = dial(&p);
        let b = dial(&p);
        let writes = Rc::new(RefCell::new(vec![]));
        let log = writes.clone();
        let _watch = b
            .subscribe(p.level, move |c| log.borrow_mut().push(*c.new_value))
            .unwrap();
        let _link = bind_two_way(&a, p.level, &b, p.level).unwrap();

        a.set(p.level, 5).unwrap();
        assert_eq!((a.get(p.level).unwrap(), b.get(p.level).unwrap()), (5, 5));
        b.set(p.level, -2).unwrap();
        assert_eq!((a.get(p.level).unwrap(), b.get(p.level).unwrap()), (-2, -2));
        assert_eq!(*writes.borrow(), vec![5, -2]);
    }

    #[test]
    fn dropping_two_way_unsubscribes_both_sides() {
        let p = props();
        let a = dial(&p);
        let b = dial(&p);
        let link = bind_two_way(&a, p.level, &b, p.level).unwrap();
        assert_eq!((a.subscriber_count(), b.subscriber_count()), (1, 1));
        drop(link);
        assert_eq!((a.subscriber_count(), b.subscriber_count()), (0, 0));
    }

    #[test]
    fn two_way_reports_failures_from_either_direction() {
        let p = props();
        let a = dial(&p);
        let b = dial(&p);
        let link = bind_two_way(&a, p.level, &b, p.even).unwrap();
        a.set(p.level, 7).unwrap();
        assert!(link.last_error().is_some());
        assert_eq!(b.get(p.even).unwrap(), 0);
    }

    #[test]
    fn target_dropped_stops_writes() {
        let p = props();
        let target = dial(&p);
        let source = Publisher::new();
        let binding = bind(&target, p.level, &source.observe()).unwrap();
        drop(target);
        source.publish(1);
        assert!(binding.last_error().is_none());
    }
}
