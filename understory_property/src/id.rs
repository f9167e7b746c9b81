// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property handles.
//!
//! [`PropertyId`] is the untyped index into a [`PropertyRegistry`](crate::PropertyRegistry);
//! [`Property<T>`] adds the value type so reads and writes are checked at compile time.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

/// Index of a registered property.
///
/// Ids are dense and assigned in registration order, so they double as
/// indices into the registry's table.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyId(u16);

impl PropertyId {
    /// Creates a property id from a raw index.
    ///
    /// Normally only [`PropertyRegistry::register`](crate::PropertyRegistry::register)
    /// hands these out.
    #[must_use]
    #[inline]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropertyId").field(&self.0).finish()
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A typed handle to a registered property.
///
/// Handles are resolved once, at registration time, and then passed around by
/// value; no lookup by name happens on the read/write path.
///
/// ```rust
/// use understory_property::{PropertyMetadataBuilder, PropertyRegistry};
///
/// struct Slider;
///
/// let mut registry = PropertyRegistry::new();
/// let value = registry.register::<Slider, f64>("Value", PropertyMetadataBuilder::new(0.0).build());
/// assert_eq!(value.id().index(), 0);
/// ```
pub struct Property<T> {
    id: PropertyId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Property<T> {
    /// Wraps a raw id.
    ///
    /// The registry rejects reads and writes through a handle whose value type
    /// does not match the registration, so a mismatched handle fails with
    /// [`PropertyError::InvalidProperty`](crate::PropertyError::InvalidProperty)
    /// rather than misbehaving.
    #[must_use]
    #[inline]
    pub const fn from_id(id: PropertyId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Returns the untyped id.
    #[must_use]
    #[inline]
    pub const fn id(self) -> PropertyId {
        self.id
    }
}

impl<T> Copy for Property<T> {}

impl<T> Clone for Property<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Property<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Property<T> {}

impl<T> Hash for Property<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("id", &self.id)
            .field("type", &core::any::type_name::<T>())
            .finish()
    }
}
