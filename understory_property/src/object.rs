// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reactive property objects.
//!
//! [`PropertyObject`] couples a [`PropertyStore`] with the shared
//! [`PropertyRegistry`], runs coercion, suppresses no-op writes, re-coerces
//! dependent properties, and notifies subscribers. [`DependencyObject`] is the
//! trait controls implement to expose their object.
//!
//! Everything here is single-threaded and synchronous. No `RefCell` borrow is
//! held while a callback runs, so subscribers may freely read and write
//! properties (including the one that just changed); such writes complete
//! depth-first before the remaining subscribers are notified.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::any::{TypeId, type_name};
use core::cell::{Cell, RefCell};
use core::fmt;
use smallvec::SmallVec;

use crate::affects::Affects;
use crate::error::PropertyError;
use crate::id::{Property, PropertyId};
use crate::registry::{PropertyRegistration, PropertyRegistry};
use crate::store::PropertyStore;
use crate::value::{ErasedValue, PropertyValue};

/// A change delivered to subscribers, after the store has been updated.
#[derive(Debug)]
pub struct PropertyChanged<'a, T> {
    /// The property that changed.
    pub property: Property<T>,
    /// Value before the write.
    pub old_value: &'a T,
    /// Value now stored.
    pub new_value: &'a T,
}

type ErasedListener = Rc<dyn Fn(&ErasedValue, &ErasedValue)>;

struct Listener {
    id: u64,
    property: PropertyId,
    active: Rc<Cell<bool>>,
    callback: ErasedListener,
}

struct ObjectInner {
    registry: Rc<PropertyRegistry>,
    owner: TypeId,
    owner_name: &'static str,
    store: RefCell<PropertyStore>,
    listeners: RefCell<Vec<Listener>>,
    next_listener: Cell<u64>,
    /// Number of coercion callbacks currently running on this object.
    coercion_depth: Cell<u32>,
    invalidation: Cell<Affects>,
}

/// A reference-counted handle to one object's properties.
///
/// Cloning the handle shares the object. Bindings hold it through
/// [`WeakPropertyObject`] so they never keep their target alive.
///
/// ```rust
/// use std::rc::Rc;
/// use understory_property::{PropertyMetadataBuilder, PropertyObject, PropertyRegistry};
///
/// struct Slider;
///
/// let mut registry = PropertyRegistry::new();
/// let value = registry.register::<Slider, f64>(
///     "Value",
///     PropertyMetadataBuilder::new(0.0).coerce(|_, v: f64| v.clamp(0.0, 1.0)).build(),
/// );
///
/// let slider = PropertyObject::new::<Slider>(Rc::new(registry));
/// assert_eq!(slider.set(value, 2.0), Ok(true));
/// assert_eq!(slider.get(value), Ok(1.0));
/// // Writing the stored value again is a no-op.
/// assert_eq!(slider.set(value, 1.0), Ok(false));
/// ```
#[derive(Clone)]
pub struct PropertyObject {
    inner: Rc<ObjectInner>,
}

/// A non-owning [`PropertyObject`] handle.
#[derive(Clone, Default)]
pub struct WeakPropertyObject {
    inner: Weak<ObjectInner>,
}

impl WeakPropertyObject {
    /// Returns the object if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<PropertyObject> {
        self.inner.upgrade().map(|inner| PropertyObject { inner })
    }
}

impl fmt::Debug for WeakPropertyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakPropertyObject")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Whether a committed change re-coerces the properties it affects.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Cascade {
    Dependents,
    Skip,
}

/// Pops the coercion depth counter even if the callback panics.
struct CoercionScope<'a>(&'a Cell<u32>);

impl<'a> CoercionScope<'a> {
    fn enter(depth: &'a Cell<u32>) -> Self {
        depth.set(depth.get() + 1);
        Self(depth)
    }
}

impl Drop for CoercionScope<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

impl PropertyObject {
    /// Creates an empty object of owner type `O`.
    ///
    /// Only properties registered on `O`, or on a type `O` derives from, can
    /// be accessed.
    #[must_use]
    pub fn new<O: 'static>(registry: Rc<PropertyRegistry>) -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                registry,
                owner: TypeId::of::<O>(),
                owner_name: type_name::<O>(),
                store: RefCell::new(PropertyStore::new()),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
                coercion_depth: Cell::new(0),
                invalidation: Cell::new(Affects::empty()),
            }),
        }
    }

    /// Returns the shared registry.
    #[must_use]
    pub fn registry(&self) -> &Rc<PropertyRegistry> {
        &self.inner.registry
    }

    /// Returns the owner type's name.
    #[must_use]
    pub fn owner_name(&self) -> &'static str {
        self.inner.owner_name
    }

    /// Returns a weak handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakPropertyObject {
        WeakPropertyObject {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Returns `true` if both handles refer to the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Checks that `property` can be used on this object.
    ///
    /// # Errors
    ///
    /// [`PropertyError::InvalidProperty`] if the property is unregistered,
    /// has a different value type, or belongs to an unrelated owner type.
    pub fn check<T: PropertyValue>(&self, property: Property<T>) -> Result<(), PropertyError> {
        self.registration(property.id(), TypeId::of::<T>()).map(|_| ())
    }

    fn registration(
        &self,
        id: PropertyId,
        value_type: TypeId,
    ) -> Result<&PropertyRegistration, PropertyError> {
        let registry = &self.inner.registry;
        match registry.get(id) {
            Some(registration)
                if registration.type_id() == value_type
                    && registry.is_valid_on(id, self.inner.owner) =>
            {
                Ok(registration)
            }
            registration => Err(PropertyError::InvalidProperty {
                id,
                name: registration.map_or("<unregistered>", PropertyRegistration::name),
                owner: self.inner.owner_name,
            }),
        }
    }

    /// Reads the accepted value of `property`, or its default if never set.
    ///
    /// # Errors
    ///
    /// [`PropertyError::InvalidProperty`], see [`check`](Self::check).
    pub fn get<T: PropertyValue>(&self, property: Property<T>) -> Result<T, PropertyError> {
        let registration = self.registration(property.id(), TypeId::of::<T>())?;
        if let Some(value) = self.inner.store.borrow().get(property) {
            return Ok(value.clone());
        }
        registration
            .metadata::<T>()
            .map(|metadata| metadata.default_value().clone())
            .ok_or(PropertyError::InvalidProperty {
                id: property.id(),
                name: registration.name(),
                owner: self.inner.owner_name,
            })
    }

    /// Returns `true` if `property` has a stored (non-default) slot.
    #[must_use]
    pub fn is_set<T: PropertyValue>(&self, property: Property<T>) -> bool {
        self.inner.store.borrow().contains(property.id())
    }

    /// Writes `property`.
    ///
    /// The value is coerced first; if the accepted value equals the current
    /// one nothing happens and `Ok(false)` is returned. Otherwise the value is
    /// stored, the property's [`Affects`] flags are recorded, dependent
    /// properties are re-coerced, and subscribers are notified in
    /// subscription order.
    ///
    /// # Errors
    ///
    /// - [`PropertyError::InvalidProperty`], see [`check`](Self::check).
    /// - [`PropertyError::WriteDuringCoercion`] if called from a coercion callback.
    /// - [`PropertyError::Coercion`] if the callback rejects the value; the
    ///   store is left untouched.
    /// - A re-coercion failure of a dependent property. This property is
    ///   already stored and its subscribers notified when that is reported.
    pub fn set<T: PropertyValue>(
        &self,
        property: Property<T>,
        value: T,
    ) -> Result<bool, PropertyError> {
        let registration = self.registration(property.id(), TypeId::of::<T>())?;
        self.ensure_not_coercing(registration)?;
        let accepted = self.coerce_typed(registration, value)?;
        self.commit(
            property.id(),
            registration,
            ErasedValue::new(accepted),
            false,
            Cascade::Dependents,
        )
    }

    /// Resets `property` to its (coerced) default and drops its stored slot.
    ///
    /// # Errors
    ///
    /// As for [`set`](Self::set).
    pub fn clear<T: PropertyValue>(&self, property: Property<T>) -> Result<bool, PropertyError> {
        let registration = self.registration(property.id(), TypeId::of::<T>())?;
        self.ensure_not_coercing(registration)?;
        let default = registration
            .metadata::<T>()
            .map(|metadata| metadata.default_value().clone())
            .ok_or(PropertyError::InvalidProperty {
                id: property.id(),
                name: registration.name(),
                owner: self.inner.owner_name,
            })?;
        let accepted = self.coerce_typed(registration, default.clone())?;
        let drop_slot = accepted == default;
        self.commit(
            property.id(),
            registration,
            ErasedValue::new(accepted),
            drop_slot,
            Cascade::Dependents,
        )
    }

    /// Re-runs `property`'s coercion against its current value.
    ///
    /// This is what [`PropertyRegistry::affects_coercion`] triggers. Returns
    /// `Ok(true)` if coercion changed the value.
    ///
    /// # Errors
    ///
    /// As for [`set`](Self::set).
    pub fn coerce_value<T: PropertyValue>(
        &self,
        property: Property<T>,
    ) -> Result<bool, PropertyError> {
        let registration = self.registration(property.id(), TypeId::of::<T>())?;
        self.ensure_not_coercing(registration)?;
        self.recoerce(property.id(), Cascade::Dependents)
    }

    /// Subscribes to changes of `property`.
    ///
    /// Only future changes are delivered. Dropping or disposing the returned
    /// subscription stops delivery immediately, including for a notification
    /// that is already in progress.
    ///
    /// # Errors
    ///
    /// [`PropertyError::InvalidProperty`], see [`check`](Self::check).
    pub fn subscribe<T, F>(
        &self,
        property: Property<T>,
        callback: F,
    ) -> Result<ChangeSubscription, PropertyError>
    where
        T: PropertyValue,
        F: Fn(&PropertyChanged<'_, T>) + 'static,
    {
        self.registration(property.id(), TypeId::of::<T>())?;
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        let active = Rc::new(Cell::new(true));
        let callback: ErasedListener = Rc::new(move |old: &ErasedValue, new: &ErasedValue| {
            if let (Some(old_value), Some(new_value)) =
                (old.downcast_ref::<T>(), new.downcast_ref::<T>())
            {
                callback(&PropertyChanged {
                    property,
                    old_value,
                    new_value,
                });
            }
        });
        self.inner.listeners.borrow_mut().push(Listener {
            id,
            property: property.id(),
            active: active.clone(),
            callback,
        });
        Ok(ChangeSubscription {
            object: Rc::downgrade(&self.inner),
            id,
            active,
        })
    }

    /// Returns the number of live subscriptions on this object.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Returns the invalidation recorded since the last [`take_invalidation`](Self::take_invalidation).
    #[must_use]
    pub fn pending_invalidation(&self) -> Affects {
        self.inner.invalidation.get()
    }

    /// Takes and clears the recorded invalidation.
    pub fn take_invalidation(&self) -> Affects {
        self.inner.invalidation.replace(Affects::empty())
    }

    /// Records invalidation directly, without a property change.
    pub fn invalidate(&self, affects: Affects) {
        let inner = &self.inner;
        inner.invalidation.set(inner.invalidation.get() | affects);
    }

    fn ensure_not_coercing(
        &self,
        registration: &PropertyRegistration,
    ) -> Result<(), PropertyError> {
        if self.inner.coercion_depth.get() > 0 {
            return Err(PropertyError::WriteDuringCoercion {
                name: registration.name(),
            });
        }
        Ok(())
    }

    fn coerce_typed<T: PropertyValue>(
        &self,
        registration: &PropertyRegistration,
        value: T,
    ) -> Result<T, PropertyError> {
        let Some(metadata) = registration.metadata::<T>() else {
            return Ok(value);
        };
        if !metadata.has_coerce_callback() {
            return Ok(value);
        }
        let _scope = CoercionScope::enter(&self.inner.coercion_depth);
        metadata
            .coerce(self, value)
            .map_err(|source| PropertyError::Coercion {
                name: registration.name(),
                source,
            })
    }

    /// Re-coerces `id` against its current value.
    fn recoerce(&self, id: PropertyId, cascade: Cascade) -> Result<bool, PropertyError> {
        let registry = Rc::clone(&self.inner.registry);
        let Some(registration) = registry.get(id) else {
            return Ok(false);
        };
        if !registration.has_coerce_callback() {
            return Ok(false);
        }
        let current = self
            .inner
            .store
            .borrow()
            .get_erased(id)
            .cloned()
            .unwrap_or_else(|| registration.default_erased());
        let accepted = {
            let _scope = CoercionScope::enter(&self.inner.coercion_depth);
            registration
                .coerce_erased(self, &current)
                .map_err(|source| PropertyError::Coercion {
                    name: registration.name(),
                    source,
                })?
        };
        tracing::trace!(
            owner = self.inner.owner_name,
            property = registration.name(),
            ?current,
            ?accepted,
            "re-coerced"
        );
        self.commit(id, registration, accepted, false, cascade)
    }

    /// Every property transitively affected by `trigger` that is valid on
    /// this object, each once, ordered so a property comes after the ones
    /// that affect it. Cycles are broken at the first revisit.
    fn cascade_order(&self, trigger: PropertyId) -> SmallVec<[PropertyId; 8]> {
        let registry = &self.inner.registry;
        let mut visited: SmallVec<[PropertyId; 8]> = SmallVec::new();
        let mut order: SmallVec<[PropertyId; 8]> = SmallVec::new();
        let mut stack: SmallVec<[(PropertyId, usize); 8]> = SmallVec::new();
        visited.push(trigger);
        stack.push((trigger, 0));
        while let Some(top) = stack.last_mut() {
            let (id, next) = *top;
            if let Some(&dependent) = registry.coercion_dependents(id).get(next) {
                top.1 += 1;
                if !visited.contains(&dependent) {
                    visited.push(dependent);
                    stack.push((dependent, 0));
                }
            } else {
                stack.pop();
                if id != trigger {
                    order.push(id);
                }
            }
        }
        order.reverse();
        order.retain(|id| registry.is_valid_on(*id, self.inner.owner));
        order
    }

    fn commit(
        &self,
        id: PropertyId,
        registration: &PropertyRegistration,
        accepted: ErasedValue,
        drop_slot: bool,
        cascade: Cascade,
    ) -> Result<bool, PropertyError> {
        let old = {
            let mut store = self.inner.store.borrow_mut();
            let current = store
                .get_erased(id)
                .cloned()
                .unwrap_or_else(|| registration.default_erased());
            if current.eq_value(&accepted) {
                if drop_slot {
                    store.remove(id);
                }
                return Ok(false);
            }
            if drop_slot {
                store.remove(id);
            } else {
                store.set_erased(id, accepted.clone());
            }
            current
        };

        tracing::trace!(
            owner = self.inner.owner_name,
            property = registration.name(),
            ?old,
            new = ?accepted,
            "property changed"
        );
        self.invalidate(registration.affects());

        // Dependents commit without cascading further: the closure already
        // covers their own dependents. Subscriber writes start a fresh change.
        let mut first_error = None;
        if cascade == Cascade::Dependents && !registration.coercion_dependents().is_empty() {
            for dependent in self.cascade_order(id) {
                if let Err(err) = self.recoerce(dependent, Cascade::Skip) {
                    first_error.get_or_insert(err);
                }
            }
        }

        self.notify(id, &old, &accepted);

        match first_error {
            Some(err) => Err(err),
            None => Ok(true),
        }
    }

    fn notify(&self, id: PropertyId, old: &ErasedValue, new: &ErasedValue) {
        let snapshot: SmallVec<[(Rc<Cell<bool>>, ErasedListener); 4]> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|listener| listener.property == id)
            .map(|listener| (listener.active.clone(), listener.callback.clone()))
            .collect();
        for (active, callback) in snapshot {
            if active.get() {
                callback(old, new);
            }
        }
    }
}

impl fmt::Debug for PropertyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyObject")
            .field("owner", &self.inner.owner_name)
            .field("values", &self.inner.store.borrow().len())
            .field("subscribers", &self.inner.listeners.borrow().len())
            .field("invalidation", &self.inner.invalidation.get())
            .finish_non_exhaustive()
    }
}

/// A live change subscription created by [`PropertyObject::subscribe`].
///
/// Disposal is idempotent; dropping the subscription disposes it.
#[must_use = "dropping a ChangeSubscription unsubscribes it"]
pub struct ChangeSubscription {
    object: Weak<ObjectInner>,
    id: u64,
    active: Rc<Cell<bool>>,
}

impl ChangeSubscription {
    /// Stops delivery and removes the subscriber.
    pub fn dispose(&mut self) {
        if !self.active.replace(false) {
            return;
        }
        if let Some(inner) = self.object.upgrade() {
            inner
                .listeners
                .borrow_mut()
                .retain(|listener| listener.id != self.id);
        }
    }

    /// Returns `true` once disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        !self.active.get()
    }
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for ChangeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSubscription")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Implemented by anything that exposes a [`PropertyObject`].
///
/// The provided methods are shorthands for the object's own operations.
pub trait DependencyObject {
    /// Returns the object's properties.
    fn property_object(&self) -> &PropertyObject;

    /// See [`PropertyObject::get`].
    ///
    /// # Errors
    ///
    /// As for [`PropertyObject::get`].
    fn get_value<T: PropertyValue>(&self, property: Property<T>) -> Result<T, PropertyError> {
        self.property_object().get(property)
    }

    /// See [`PropertyObject::set`].
    ///
    /// # Errors
    ///
    /// As for [`PropertyObject::set`].
    fn set_value<T: PropertyValue>(
        &self,
        property: Property<T>,
        value: T,
    ) -> Result<bool, PropertyError> {
        self.property_object().set(property, value)
    }

    /// See [`PropertyObject::clear`].
    ///
    /// # Errors
    ///
    /// As for [`PropertyObject::clear`].
    fn clear_value<T: PropertyValue>(&self, property: Property<T>) -> Result<bool, PropertyError> {
        self.property_object().clear(property)
    }
}

impl DependencyObject for PropertyObject {
    fn property_object(&self) -> &PropertyObject {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoerceError;
    use crate::metadata::{PropertyMetadata, PropertyMetadataBuilder};
    use alloc::format;
    use alloc::vec;

    struct Range;
    struct Other;

    struct RangeProps {
        minimum: Property<f64>,
        maximum: Property<f64>,
        value: Property<f64>,
        label: Property<i32>,
    }

    fn range() -> (PropertyObject, RangeProps) {
        let mut registry = PropertyRegistry::new();
        let minimum = registry.register::<Range, f64>(
            "Minimum",
            PropertyMetadataBuilder::new(0.0).affects(Affects::ARRANGE).build(),
        );
        let maximum = registry.register::<Range, f64>(
            "Maximum",
            PropertyMetadataBuilder::new(100.0).affects(Affects::ARRANGE).build(),
        );
        let value = registry.register::<Range, f64>(
            "Value",
            PropertyMetadataBuilder::new(0.0)
                .coerce(move |owner, v: f64| {
                    let min = owner.get(minimum).unwrap_or(0.0);
                    let max = owner.get(maximum).unwrap_or(0.0).max(min);
                    v.clamp(min, max)
                })
                .build(),
        );
        let label = registry.register::<Range, i32>(
            "Label",
            PropertyMetadataBuilder::new(0)
                .try_coerce(|_, v: i32| {
                    if v < 0 {
                        Err(CoerceError::new("negative label"))
                    } else {
                        Ok(v)
                    }
                })
                .build(),
        );
        registry.affects_coercion(minimum, value);
        registry.affects_coercion(maximum, value);
        let props = RangeProps {
            minimum,
            maximum,
            value,
            label,
        };
        (PropertyObject::new::<Range>(Rc::new(registry)), props)
    }

    fn record<T: PropertyValue>(
        object: &PropertyObject,
        property: Property<T>,
    ) -> (Rc<RefCell<Vec<(T, T)>>>, ChangeSubscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let sub = object
            .subscribe(property, move |change| {
                sink.borrow_mut()
                    .push((change.old_value.clone(), change.new_value.clone()));
            })
            .unwrap();
        (log, sub)
    }

    #[test]
    fn unset_reads_default() {
        let (object, props) = range();
        assert_eq!(object.get(props.maximum), Ok(100.0));
        assert!(!object.is_set(props.maximum));
    }

    #[test]
    fn set_notifies_with_old_and_new() {
        let (object, props) = range();
        let (log, _sub) = record(&object, props.value);
        assert_eq!(object.set(props.value, 25.0), Ok(true));
        assert_eq!(object.get(props.value), Ok(25.0));
        assert_eq!(*log.borrow(), vec![(0.0, 25.0)]);
    }

    #[test]
    fn writing_the_current_value_is_silent() {
        let (object, props) = range();
        let (log, _sub) = record(&object, props.maximum);
        assert_eq!(object.set(props.maximum, 100.0), Ok(false));
        object.set(props.maximum, 50.0).unwrap();
        assert_eq!(object.set(props.maximum, 50.0), Ok(false));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn coercion_runs_before_store_and_notification() {
        let (object, props) = range();
        let (log, _sub) = record(&object, props.value);
        object.set(props.value, 250.0).unwrap();
        assert_eq!(object.get(props.value), Ok(100.0));
        assert_eq!(*log.borrow(), vec![(0.0, 100.0)]);
        // Clamped to the value already stored: no change.
        assert_eq!(object.set(props.value, 1000.0), Ok(false));
    }

    #[test]
    fn failed_coercion_leaves_store_untouched() {
        let (object, props) = range();
        let (log, _sub) = record(&object, props.label);
        object.set(props.label, 3).unwrap();
        let err = object.set(props.label, -1).unwrap_err();
        assert!(matches!(err, PropertyError::Coercion { name: "Label", .. }), "{err:?}");
        assert_eq!(object.get(props.label), Ok(3));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn dependents_are_recoerced() {
        let (object, props) = range();
        let (log, _sub) = record(&object, props.value);
        object.set(props.value, 80.0).unwrap();
        object.set(props.maximum, 60.0).unwrap();
        assert_eq!(object.get(props.value), Ok(60.0));
        // Raising the bound again does not restore the old value.
        object.set(props.maximum, 90.0).unwrap();
        assert_eq!(object.get(props.value), Ok(60.0));
        assert_eq!(*log.borrow(), vec![(0.0, 80.0), (80.0, 60.0)]);
    }

    #[test]
    fn dependent_is_recoerced_before_trigger_subscribers_run() {
        let (object, props) = range();
        object.set(props.value, 80.0).unwrap();
        let seen = Rc::new(Cell::new(f64::NAN));
        let sink = seen.clone();
        let reader = object.clone();
        let value = props.value;
        let _sub = object
            .subscribe(props.maximum, move |_| sink.set(reader.get(value).unwrap()))
            .unwrap();
        object.set(props.maximum, 10.0).unwrap();
        assert_eq!(seen.get(), 10.0);
    }

    #[test]
    fn subscriber_can_tighten_a_bound_during_recoercion() {
        let (object, props) = range();
        object.set(props.value, 80.0).unwrap();
        let writer = object.clone();
        let maximum = props.maximum;
        let _sub = object
            .subscribe(props.value, move |change| {
                if *change.new_value == 60.0 {
                    writer.set(maximum, 30.0).unwrap();
                }
            })
            .unwrap();
        object.set(props.maximum, 60.0).unwrap();
        assert_eq!(object.get(props.maximum), Ok(30.0));
        assert_eq!(object.get(props.value), Ok(30.0));
    }

    #[test]
    fn each_dependent_is_recoerced_once_per_change() {
        struct Chain;
        let mut registry = PropertyRegistry::new();
        let a = registry.register::<Chain, f64>("A", PropertyMetadata::new(0.0));
        let b = registry.register::<Chain, f64>(
            "B",
            PropertyMetadataBuilder::new(0.0)
                .coerce(move |owner, v: f64| v.min(owner.get(a).unwrap_or(0.0)))
                .build(),
        );
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let c = registry.register::<Chain, f64>(
            "C",
            PropertyMetadataBuilder::new(0.0)
                .coerce(move |owner, v: f64| {
                    counter.set(counter.get() + 1);
                    v.min(owner.get(b).unwrap_or(0.0))
                })
                .build(),
        );
        // C is listed before B so it must still wait for B's new value.
        registry.affects_coercion(a, c);
        registry.affects_coercion(a, b);
        registry.affects_coercion(b, c);
        let object = PropertyObject::new::<Chain>(Rc::new(registry));

        object.set(a, -5.0).unwrap();
        assert_eq!(object.get(b), Ok(-5.0));
        assert_eq!(object.get(c), Ok(-5.0));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn dependents_of_derived_types_are_skipped_on_base_objects() {
        struct Base;
        struct Derived;
        let mut registry = PropertyRegistry::new();
        registry.derive::<Derived, Base>();
        let width = registry.register::<Base, f64>("Width", PropertyMetadata::new(0.0));
        let offset = registry.register::<Derived, f64>(
            "Offset",
            PropertyMetadataBuilder::new(5.0)
                .coerce(move |owner, v: f64| v.min(owner.get(width).unwrap_or(0.0)))
                .build(),
        );
        registry.affects_coercion(width, offset);
        let registry = Rc::new(registry);

        let base = PropertyObject::new::<Base>(registry.clone());
        base.set(width, 1.0).unwrap();
        assert!(!base.is_set(offset));
        assert!(format!("{base:?}").contains("values: 1"));

        let derived = PropertyObject::new::<Derived>(registry);
        derived.set(width, 2.0).unwrap();
        assert_eq!(derived.get(offset), Ok(2.0));
    }

    #[test]
    fn invalid_properties_are_rejected() {
        let (object, _) = range();
        let mut registry = PropertyRegistry::new();
        let foreign = registry.register::<Other, f64>("Foreign", PropertyMetadata::new(0.0));
        let unregistered: Property<f64> = Property::from_id(PropertyId::new(99));

        assert!(matches!(
            object.get(unregistered),
            Err(PropertyError::InvalidProperty { name: "<unregistered>", .. })
        ));
        // Id 0 exists on the object's registry, but as f64 "Minimum".
        let wrong_type: Property<bool> = Property::from_id(foreign.id());
        assert!(object.set(wrong_type, true).is_err());
        assert!(object.subscribe(unregistered, |_| {}).is_err());
    }

    #[test]
    fn owner_type_is_enforced() {
        let mut registry = PropertyRegistry::new();
        let width = registry.register::<Other, f64>("Width", PropertyMetadata::new(0.0));
        let object = PropertyObject::new::<Range>(Rc::new(registry));
        let err = object.set(width, 1.0).unwrap_err();
        assert!(matches!(err, PropertyError::InvalidProperty { name: "Width", .. }));
    }

    #[test]
    fn coercion_callbacks_cannot_write() {
        struct Owner;
        let mut registry = PropertyRegistry::new();
        let other = registry.register::<Owner, i32>("Other", PropertyMetadata::new(0));
        let guarded = registry.register::<Owner, i32>(
            "Guarded",
            PropertyMetadataBuilder::new(0)
                .try_coerce(move |owner, v: i32| {
                    owner.set(other, v)?;
                    Ok(v)
                })
                .build(),
        );
        let object = PropertyObject::new::<Owner>(Rc::new(registry));
        let err = object.set(guarded, 5).unwrap_err();
        let PropertyError::Coercion { source, .. } = err else {
            panic!("expected a coercion error, got {err:?}");
        };
        assert!(source.message().contains("Other"), "{source}");
        assert_eq!(object.get(other), Ok(0));
        assert_eq!(object.get(guarded), Ok(0));
    }

    #[test]
    fn subscribers_run_in_order_and_depth_first() {
        let (object, props) = range();
        let order = Rc::new(RefCell::new(Vec::new()));

        let first = {
            let order = order.clone();
            let writer = object.clone();
            let maximum = props.maximum;
            object
                .subscribe(props.value, move |change| {
                    order.borrow_mut().push("first");
                    if *change.new_value == 10.0 {
                        writer.set(maximum, 50.0).unwrap();
                    }
                })
                .unwrap()
        };
        let nested = {
            let order = order.clone();
            object
                .subscribe(props.maximum, move |_| order.borrow_mut().push("maximum"))
                .unwrap()
        };
        let second = {
            let order = order.clone();
            object
                .subscribe(props.value, move |_| order.borrow_mut().push("second"))
                .unwrap()
        };

        object.set(props.value, 10.0).unwrap();
        assert_eq!(*order.borrow(), vec!["first", "maximum", "second"]);
        drop((first, nested, second));
        assert_eq!(object.subscriber_count(), 0);
    }

    #[test]
    fn reentrant_write_of_same_property_terminates() {
        let (object, props) = range();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let writer = object.clone();
        let value = props.value;
        let _sub = object
            .subscribe(value, move |change| {
                counter.set(counter.get() + 1);
                // Echo the value back, as the reverse half of a two-way link would.
                writer.set(value, *change.new_value).unwrap();
            })
            .unwrap();
        object.set(value, 42.0).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn disposal_is_immediate_and_idempotent() {
        let (object, props) = range();
        let hits = Rc::new(Cell::new(0));
        let late = Rc::new(RefCell::new(None::<ChangeSubscription>));

        let killer = {
            let late = late.clone();
            object
                .subscribe(props.value, move |_| {
                    if let Some(sub) = late.borrow_mut().as_mut() {
                        sub.dispose();
                    }
                })
                .unwrap()
        };
        let counter = hits.clone();
        *late.borrow_mut() = Some(
            object
                .subscribe(props.value, move |_| counter.set(counter.get() + 1))
                .unwrap(),
        );

        object.set(props.value, 1.0).unwrap();
        assert_eq!(hits.get(), 0);

        let mut sub = late.borrow_mut().take().unwrap();
        assert!(sub.is_disposed());
        sub.dispose();
        drop(killer);
        assert_eq!(object.subscriber_count(), 0);
    }

    #[test]
    fn affects_flags_accumulate_until_taken() {
        let (object, props) = range();
        assert!(object.pending_invalidation().is_empty());
        object.set(props.value, 5.0).unwrap();
        assert!(object.pending_invalidation().is_empty());
        object.set(props.maximum, 50.0).unwrap();
        assert_eq!(object.take_invalidation(), Affects::ARRANGE);
        assert!(object.pending_invalidation().is_empty());
        object.set(props.maximum, 50.0).unwrap();
        assert!(object.pending_invalidation().is_empty());
    }

    #[test]
    fn clear_restores_default() {
        let (object, props) = range();
        let (log, _sub) = record(&object, props.maximum);
        object.set(props.maximum, 30.0).unwrap();
        assert!(object.is_set(props.maximum));
        assert_eq!(object.clear(props.maximum), Ok(true));
        assert!(!object.is_set(props.maximum));
        assert_eq!(object.get(props.maximum), Ok(100.0));
        assert_eq!(object.clear(props.maximum), Ok(false));
        assert_eq!(*log.borrow(), vec![(100.0, 30.0), (30.0, 100.0)]);
    }

    #[test]
    fn explicit_recoercion() {
        let (object, props) = range();
        assert_eq!(object.coerce_value(props.value), Ok(false));
        assert_eq!(object.coerce_value(props.maximum), Ok(false));
    }

    #[test]
    fn weak_handles_do_not_keep_objects_alive() {
        let (object, _) = range();
        let weak = object.downgrade();
        assert!(weak.upgrade().is_some_and(|o| o.ptr_eq(&object)));
        drop(object);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn dependency_object_shorthands() {
        let (object, props) = range();
        object.set_value(props.minimum, 10.0).unwrap();
        assert_eq!(object.get_value(props.value), Ok(10.0));
        assert_eq!(object.clear_value(props.minimum), Ok(true));
    }
}
