// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-object sparse property storage.
//!
//! [`PropertyStore`] only holds properties that have been written; everything
//! else reads through to the registered default. Entries live in a sorted
//! `SmallVec` searched with binary search, which keeps lookups cache-friendly
//! for the handful of properties a typical control sets.

use smallvec::SmallVec;

use crate::id::{Property, PropertyId};
use crate::value::{ErasedValue, PropertyValue};

/// Most controls set fewer than this many properties.
const INLINE_CAPACITY: usize = 8;

/// Sparse map from [`PropertyId`] to the accepted (post-coercion) value.
///
/// The store itself does no validation, coercion, or notification; it is the
/// raw slot table behind a [`PropertyObject`](crate::PropertyObject).
///
/// ```rust
/// use understory_property::{ErasedValue, Property, PropertyId, PropertyStore};
///
/// let width: Property<f64> = Property::from_id(PropertyId::new(0));
/// let mut store = PropertyStore::new();
/// assert!(store.get(width).is_none());
///
/// store.set_erased(width.id(), ErasedValue::new(100.0_f64));
/// assert_eq!(store.get(width), Some(&100.0));
/// assert!(store.remove(width.id()).is_some());
/// assert!(store.is_empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct PropertyStore {
    entries: SmallVec<[(PropertyId, ErasedValue); INLINE_CAPACITY]>,
}

impl PropertyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no property has a stored value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over the ids with stored values, in id order.
    pub fn property_ids(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    #[inline]
    fn find(&self, id: PropertyId) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&id, |(pid, _)| *pid)
    }

    /// Returns `true` if `id` has a stored value.
    #[must_use]
    #[inline]
    pub fn contains(&self, id: PropertyId) -> bool {
        self.find(id).is_ok()
    }

    /// Returns the stored value for `id`.
    #[must_use]
    pub fn get_erased(&self, id: PropertyId) -> Option<&ErasedValue> {
        self.find(id).ok().map(|idx| &self.entries[idx].1)
    }

    /// Returns the stored value for a typed property.
    ///
    /// `None` if nothing is stored or the stored value has another type.
    #[must_use]
    pub fn get<T: PropertyValue>(&self, property: Property<T>) -> Option<&T> {
        self.get_erased(property.id())
            .and_then(ErasedValue::downcast_ref)
    }

    /// Stores `value`, returning the previous value if there was one.
    pub fn set_erased(&mut self, id: PropertyId, value: ErasedValue) -> Option<ErasedValue> {
        match self.find(id) {
            Ok(idx) => Some(core::mem::replace(&mut self.entries[idx].1, value)),
            Err(idx) => {
                self.entries.insert(idx, (id, value));
                None
            }
        }
    }

    /// Removes the stored value for `id`.
    pub fn remove(&mut self, id: PropertyId) -> Option<ErasedValue> {
        self.find(id).ok().map(|idx| self.entries.remove(idx).1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn prop(index: u16) -> Property<i32> {
        Property::from_id(PropertyId::new(index))
    }

    #[test]
    fn entries_stay_sorted() {
        let mut store = PropertyStore::new();
        for index in [5, 1, 3, 0] {
            store.set_erased(PropertyId::new(index), ErasedValue::new(i32::from(index)));
        }
        let ids: Vec<_> = store.property_ids().map(PropertyId::index).collect();
        assert_eq!(ids, [0, 1, 3, 5]);
        assert_eq!(store.get(prop(3)), Some(&3));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn set_returns_previous_value() {
        let mut store = PropertyStore::new();
        assert!(store.set_erased(PropertyId::new(2), ErasedValue::new(1_i32)).is_none());
        let old = store.set_erased(PropertyId::new(2), ErasedValue::new(9_i32));
        assert_eq!(old.and_then(|v| v.downcast_ref::<i32>().copied()), Some(1));
        assert_eq!(store.get(prop(2)), Some(&9));
    }

    #[test]
    fn typed_get_rejects_wrong_type() {
        let mut store = PropertyStore::new();
        store.set_erased(PropertyId::new(0), ErasedValue::new(1.0_f64));
        assert!(store.get(prop(0)).is_none());
        assert!(store.contains(PropertyId::new(0)));
    }

    #[test]
    fn remove_missing_is_none() {
        let mut store = PropertyStore::new();
        assert!(store.remove(PropertyId::new(4)).is_none());
        store.set_erased(PropertyId::new(4), ErasedValue::new(4_i32));
        assert!(store.remove(PropertyId::new(4)).is_some());
        assert!(store.is_empty());
    }
}
