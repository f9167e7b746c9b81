// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property registry.
//!
//! The registry is filled once, at type-registration time, and then frozen
//! behind an `Rc` shared by every [`PropertyObject`](crate::PropertyObject).
//! Besides the registrations themselves it holds the owner-type hierarchy and
//! the "affects coercion" graph.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, TypeId, type_name};
use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::affects::Affects;
use crate::error::CoerceError;
use crate::id::{Property, PropertyId};
use crate::metadata::PropertyMetadata;
use crate::object::PropertyObject;
use crate::value::{ErasedValue, PropertyValue};

/// A registration entry: name, owner, value type, metadata, and the
/// properties whose coercion depends on this one.
pub struct PropertyRegistration {
    name: &'static str,
    owner: TypeId,
    owner_name: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    metadata: Box<dyn ErasedMetadata>,
    coercion_dependents: SmallVec<[PropertyId; 2]>,
}

impl PropertyRegistration {
    /// Returns the property name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the [`TypeId`] of the owner type the property was registered on.
    #[must_use]
    #[inline]
    pub fn owner(&self) -> TypeId {
        self.owner
    }

    /// Returns the owner type's name.
    #[must_use]
    #[inline]
    pub fn owner_name(&self) -> &'static str {
        self.owner_name
    }

    /// Returns the [`TypeId`] of the value type.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the value type's name.
    #[must_use]
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the passes a change to this property invalidates.
    #[must_use]
    #[inline]
    pub fn affects(&self) -> Affects {
        self.metadata.affects()
    }

    /// Returns the properties re-coerced after this one changes.
    #[must_use]
    #[inline]
    pub fn coercion_dependents(&self) -> &[PropertyId] {
        &self.coercion_dependents
    }

    /// Returns whether a coercion callback is registered.
    #[must_use]
    #[inline]
    pub fn has_coerce_callback(&self) -> bool {
        self.metadata.has_coerce_callback()
    }

    pub(crate) fn default_erased(&self) -> ErasedValue {
        self.metadata.default_erased()
    }

    pub(crate) fn coerce_erased(
        &self,
        owner: &PropertyObject,
        value: &ErasedValue,
    ) -> Result<ErasedValue, CoerceError> {
        self.metadata.coerce_erased(owner, value)
    }

    pub(crate) fn metadata<T: PropertyValue>(&self) -> Option<&PropertyMetadata<T>> {
        self.metadata.as_any().downcast_ref()
    }
}

impl core::fmt::Debug for PropertyRegistration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyRegistration")
            .field("name", &self.name)
            .field("owner", &self.owner_name)
            .field("type", &self.type_name)
            .field("affects", &self.affects())
            .field("coercion_dependents", &self.coercion_dependents)
            .finish_non_exhaustive()
    }
}

/// A registry of dependency properties, keyed by (owner type, name).
///
/// ```rust
/// use understory_property::{Affects, PropertyMetadataBuilder, PropertyRegistry};
///
/// struct Visual;
/// struct Button;
///
/// let mut registry = PropertyRegistry::new();
/// let opacity = registry.register::<Visual, f64>(
///     "Opacity",
///     PropertyMetadataBuilder::new(1.0).affects(Affects::RENDER).build(),
/// );
/// registry.derive::<Button, Visual>();
///
/// assert_eq!(registry.by_name::<Button>("Opacity"), Some(opacity.id()));
/// assert!(registry.is_valid_on(opacity.id(), core::any::TypeId::of::<Button>()));
/// assert!(registry.affects(opacity.id()).contains(Affects::RENDER));
/// ```
#[derive(Default)]
pub struct PropertyRegistry {
    properties: Vec<PropertyRegistration>,
    by_name: HashMap<(TypeId, &'static str), PropertyId>,
    bases: HashMap<TypeId, TypeId>,
}

impl PropertyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a property named `name` on owner type `O`.
    ///
    /// # Panics
    ///
    /// Panics if `O` already has a property called `name`, or if more than
    /// 65,535 properties are registered.
    pub fn register<O: 'static, T: PropertyValue>(
        &mut self,
        name: &'static str,
        metadata: PropertyMetadata<T>,
    ) -> Property<T> {
        let owner = TypeId::of::<O>();
        assert!(
            !self.by_name.contains_key(&(owner, name)),
            "Property '{name}' is already registered on {}",
            type_name::<O>()
        );
        assert!(
            self.properties.len() < u16::MAX as usize,
            "Too many properties registered (max {})",
            u16::MAX
        );

        #[expect(clippy::cast_possible_truncation, reason = "checked above")]
        let id = PropertyId::new(self.properties.len() as u16);

        self.properties.push(PropertyRegistration {
            name,
            owner,
            owner_name: type_name::<O>(),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            metadata: Box::new(metadata),
            coercion_dependents: SmallVec::new(),
        });
        self.by_name.insert((owner, name), id);

        Property::from_id(id)
    }

    /// Declares that `Child` has every property valid on `Parent`.
    ///
    /// # Panics
    ///
    /// Panics if `Child` already has a parent or if the declaration would
    /// create a cycle.
    pub fn derive<Child: 'static, Parent: 'static>(&mut self) {
        let child = TypeId::of::<Child>();
        let parent = TypeId::of::<Parent>();
        assert!(
            !self.bases.contains_key(&child),
            "{} already derives from another owner type",
            type_name::<Child>()
        );
        assert!(
            !self.ancestry(parent).any(|t| t == child),
            "deriving {} from {} would create a cycle",
            type_name::<Child>(),
            type_name::<Parent>()
        );
        self.bases.insert(child, parent);
    }

    /// Declares that whenever `trigger` changes, `dependent`'s coercion is
    /// re-run against its current value.
    ///
    /// Repeated declarations of the same pair are ignored.
    ///
    /// # Panics
    ///
    /// Panics if either property is not registered.
    pub fn affects_coercion<A, B>(&mut self, trigger: Property<A>, dependent: Property<B>) {
        assert!(
            self.get(dependent.id()).is_some(),
            "affected property {:?} is not registered",
            dependent.id()
        );
        let registration = self.registration_mut(trigger.id());
        if !registration.coercion_dependents.contains(&dependent.id()) {
            registration.coercion_dependents.push(dependent.id());
        }
    }

    /// Declares that changing `property` invalidates its owner's measure pass.
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered.
    pub fn affects_measure<T>(&mut self, property: Property<T>) {
        self.registration_mut(property.id())
            .metadata
            .add_affects(Affects::MEASURE);
    }

    /// Declares that changing `property` invalidates its owner's arrange pass.
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered.
    pub fn affects_arrange<T>(&mut self, property: Property<T>) {
        self.registration_mut(property.id())
            .metadata
            .add_affects(Affects::ARRANGE);
    }

    /// Declares that changing `property` requires its owner to be redrawn.
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered.
    pub fn affects_render<T>(&mut self, property: Property<T>) {
        self.registration_mut(property.id())
            .metadata
            .add_affects(Affects::RENDER);
    }

    fn registration_mut(&mut self, id: PropertyId) -> &mut PropertyRegistration {
        match self.properties.get_mut(id.index() as usize) {
            Some(registration) => registration,
            None => panic!("Property {id:?} is not registered"),
        }
    }

    /// Returns the number of registered properties.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Looks up a property by name on `O` or any type `O` derives from.
    #[must_use]
    pub fn by_name<O: 'static>(&self, name: &str) -> Option<PropertyId> {
        self.by_name_on(TypeId::of::<O>(), name)
    }

    /// Untyped form of [`by_name`](Self::by_name).
    #[must_use]
    pub fn by_name_on(&self, owner: TypeId, name: &str) -> Option<PropertyId> {
        self.ancestry(owner)
            .find_map(|t| self.by_name.get(&(t, name)).copied())
    }

    /// Returns the name of a property.
    #[must_use]
    pub fn name(&self, id: PropertyId) -> Option<&'static str> {
        self.get(id).map(PropertyRegistration::name)
    }

    /// Returns the registration for a property.
    #[must_use]
    pub fn get(&self, id: PropertyId) -> Option<&PropertyRegistration> {
        self.properties.get(id.index() as usize)
    }

    /// Returns the passes invalidated by a property, or none if unregistered.
    #[must_use]
    pub fn affects(&self, id: PropertyId) -> Affects {
        self.get(id)
            .map(PropertyRegistration::affects)
            .unwrap_or_default()
    }

    /// Returns the properties whose coercion `id` affects.
    #[must_use]
    pub fn coercion_dependents(&self, id: PropertyId) -> &[PropertyId] {
        self.get(id)
            .map(PropertyRegistration::coercion_dependents)
            .unwrap_or_default()
    }

    /// Returns `true` if `id` can be read or written on objects of type `owner`.
    #[must_use]
    pub fn is_valid_on(&self, id: PropertyId, owner: TypeId) -> bool {
        self.get(id)
            .is_some_and(|r| self.ancestry(owner).any(|t| t == r.owner))
    }

    /// Returns the typed metadata of a property.
    ///
    /// Returns `None` if the property is not registered or the type doesn't match.
    #[must_use]
    pub fn get_metadata<T: PropertyValue>(
        &self,
        property: Property<T>,
    ) -> Option<&PropertyMetadata<T>> {
        self.get(property.id()).and_then(PropertyRegistration::metadata)
    }

    /// Iterates over every registration in id order.
    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &PropertyRegistration)> {
        self.properties.iter().enumerate().map(|(i, r)| {
            #[expect(clippy::cast_possible_truncation, reason = "index < len < u16::MAX")]
            (PropertyId::new(i as u16), r)
        })
    }

    /// `owner` followed by each type it derives from.
    fn ancestry(&self, owner: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        core::iter::successors(Some(owner), |t| self.bases.get(t).copied())
    }
}

impl core::fmt::Debug for PropertyRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyRegistry")
            .field("count", &self.properties.len())
            .field(
                "properties",
                &self
                    .properties
                    .iter()
                    .map(|r| (r.owner_name, r.name))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Metadata with the value type erased, so registrations of different types
/// share one table.
trait ErasedMetadata: Any {
    fn as_any(&self) -> &dyn Any;
    fn affects(&self) -> Affects;
    fn add_affects(&mut self, affects: Affects);
    fn has_coerce_callback(&self) -> bool;
    fn default_erased(&self) -> ErasedValue;
    fn coerce_erased(
        &self,
        owner: &PropertyObject,
        value: &ErasedValue,
    ) -> Result<ErasedValue, CoerceError>;
}

impl<T: PropertyValue> ErasedMetadata for PropertyMetadata<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn affects(&self) -> Affects {
        Self::affects(self)
    }

    fn add_affects(&mut self, affects: Affects) {
        Self::add_affects(self, affects);
    }

    fn has_coerce_callback(&self) -> bool {
        Self::has_coerce_callback(self)
    }

    fn default_erased(&self) -> ErasedValue {
        ErasedValue::new(self.default_value().clone())
    }

    fn coerce_erased(
        &self,
        owner: &PropertyObject,
        value: &ErasedValue,
    ) -> Result<ErasedValue, CoerceError> {
        let Some(value) = value.downcast_ref::<T>() else {
            return Err(CoerceError::new("stored value has the wrong type"));
        };
        self.coerce(owner, value.clone()).map(ErasedValue::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::PropertyMetadataBuilder;
    use alloc::{format, vec, vec::Vec};

    struct Visual;
    struct RangeBase;
    struct Slider;

    #[test]
    fn register_assigns_dense_ids() {
        let mut registry = PropertyRegistry::new();
        assert!(registry.is_empty());
        let min = registry.register::<RangeBase, f64>("Minimum", PropertyMetadata::new(0.0));
        let max = registry.register::<RangeBase, f64>("Maximum", PropertyMetadata::new(1.0));
        assert_eq!(min.id().index(), 0);
        assert_eq!(max.id().index(), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.name(max.id()), Some("Maximum"));
        assert_eq!(registry.get(max.id()).unwrap().owner_name(), type_name::<RangeBase>());
    }

    #[test]
    fn same_name_on_different_owners() {
        let mut registry = PropertyRegistry::new();
        let a = registry.register::<Visual, f64>("Width", PropertyMetadata::new(0.0));
        let b = registry.register::<Slider, f64>("Width", PropertyMetadata::new(0.0));
        assert_ne!(a.id(), b.id());
        assert_eq!(registry.by_name::<Visual>("Width"), Some(a.id()));
        assert_eq!(registry.by_name::<Slider>("Width"), Some(b.id()));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_owner_and_name_panics() {
        let mut registry = PropertyRegistry::new();
        registry.register::<Visual, f64>("Width", PropertyMetadata::new(0.0));
        registry.register::<Visual, f64>("Width", PropertyMetadata::new(0.0));
    }

    #[test]
    fn derived_types_see_base_properties() {
        let mut registry = PropertyRegistry::new();
        let visible = registry.register::<Visual, bool>("IsVisible", PropertyMetadata::new(true));
        let value = registry.register::<RangeBase, f64>("Value", PropertyMetadata::new(0.0));
        registry.derive::<RangeBase, Visual>();
        registry.derive::<Slider, RangeBase>();

        let slider = TypeId::of::<Slider>();
        assert!(registry.is_valid_on(visible.id(), slider));
        assert!(registry.is_valid_on(value.id(), slider));
        assert!(!registry.is_valid_on(value.id(), TypeId::of::<Visual>()));
        assert_eq!(registry.by_name::<Slider>("IsVisible"), Some(visible.id()));
        assert_eq!(registry.by_name::<Visual>("Value"), None);
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn derive_cycle_panics() {
        let mut registry = PropertyRegistry::new();
        registry.derive::<Slider, RangeBase>();
        registry.derive::<RangeBase, Slider>();
    }

    #[test]
    fn affects_coercion_deduplicates() {
        let mut registry = PropertyRegistry::new();
        let max = registry.register::<RangeBase, f64>("Maximum", PropertyMetadata::new(1.0));
        let min = registry.register::<RangeBase, f64>("Minimum", PropertyMetadata::new(0.0));
        let value = registry.register::<RangeBase, f64>("Value", PropertyMetadata::new(0.0));
        registry.affects_coercion(max, value);
        registry.affects_coercion(max, value);
        registry.affects_coercion(min, value);

        assert_eq!(registry.coercion_dependents(max.id()), &[value.id()]);
        assert_eq!(registry.coercion_dependents(min.id()), &[value.id()]);
        assert!(registry.coercion_dependents(value.id()).is_empty());
    }

    #[test]
    fn affects_flags_accumulate() {
        let mut registry = PropertyRegistry::new();
        let width = registry.register::<Visual, f64>(
            "Width",
            PropertyMetadataBuilder::new(0.0).affects(Affects::RENDER).build(),
        );
        registry.affects_measure(width);
        registry.affects_arrange(width);
        assert_eq!(
            registry.affects(width.id()),
            Affects::MEASURE | Affects::ARRANGE | Affects::RENDER
        );
        registry.affects_render(width);
        assert_eq!(registry.get_metadata(width).unwrap().affects(), registry.affects(width.id()));
    }

    #[test]
    fn metadata_lookup_checks_type() {
        let mut registry = PropertyRegistry::new();
        let width = registry.register::<Visual, f64>("Width", PropertyMetadata::new(12.0));
        assert_eq!(registry.get_metadata(width).unwrap().default_value(), &12.0);
        let wrong: Property<i32> = Property::from_id(width.id());
        assert!(registry.get_metadata(wrong).is_none());
    }

    #[test]
    fn iter_in_registration_order() {
        let mut registry = PropertyRegistry::new();
        registry.register::<Visual, f64>("Width", PropertyMetadata::new(0.0));
        registry.register::<Visual, f64>("Height", PropertyMetadata::new(0.0));
        let names: Vec<_> = registry.iter().map(|(_, r)| r.name()).collect();
        assert_eq!(names, vec!["Width", "Height"]);
        assert!(format!("{registry:?}").contains("Height"));
    }
}
