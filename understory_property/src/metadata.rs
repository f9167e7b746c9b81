// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property metadata definitions.
//!
//! [`PropertyMetadata`] is the immutable per-property configuration: default
//! value, coercion callback, and the [`Affects`] flags. Build it with
//! [`PropertyMetadataBuilder`].

use alloc::boxed::Box;

use crate::affects::Affects;
use crate::error::CoerceError;
use crate::object::PropertyObject;
use crate::value::PropertyValue;

/// Callback that turns a proposed value into the accepted one.
///
/// It receives the object being written so it can read that object's other
/// properties (an offset reading its extent, say). It must not write any
/// property; such writes fail with
/// [`PropertyError::WriteDuringCoercion`](crate::PropertyError::WriteDuringCoercion).
pub type CoerceValueCallback<T> = Box<dyn Fn(&PropertyObject, T) -> Result<T, CoerceError>>;

/// Metadata for a dependency property.
///
/// ```rust
/// use understory_property::{Affects, PropertyMetadataBuilder};
///
/// let metadata = PropertyMetadataBuilder::new(0.0_f64)
///     .affects(Affects::MEASURE)
///     .coerce(|_, v: f64| v.max(0.0))
///     .build();
///
/// assert_eq!(metadata.default_value(), &0.0);
/// assert!(metadata.affects().contains(Affects::MEASURE));
/// assert!(metadata.has_coerce_callback());
/// ```
pub struct PropertyMetadata<T: PropertyValue> {
    default_value: T,
    affects: Affects,
    coerce_callback: Option<CoerceValueCallback<T>>,
}

impl<T: PropertyValue> PropertyMetadata<T> {
    /// Creates metadata with only a default value.
    #[must_use]
    pub fn new(default_value: T) -> Self {
        Self {
            default_value,
            affects: Affects::empty(),
            coerce_callback: None,
        }
    }

    /// Returns the default value.
    #[must_use]
    #[inline]
    pub fn default_value(&self) -> &T {
        &self.default_value
    }

    /// Returns the passes a change to this property invalidates.
    #[must_use]
    #[inline]
    pub fn affects(&self) -> Affects {
        self.affects
    }

    pub(crate) fn add_affects(&mut self, affects: Affects) {
        self.affects |= affects;
    }

    /// Runs the coercion callback, or returns `value` unchanged if there is none.
    ///
    /// # Errors
    ///
    /// Whatever the callback returns.
    pub fn coerce(&self, owner: &PropertyObject, value: T) -> Result<T, CoerceError> {
        match &self.coerce_callback {
            Some(callback) => callback(owner, value),
            None => Ok(value),
        }
    }

    /// Returns whether a coercion callback is set.
    #[must_use]
    #[inline]
    pub fn has_coerce_callback(&self) -> bool {
        self.coerce_callback.is_some()
    }
}

impl<T: PropertyValue> core::fmt::Debug for PropertyMetadata<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyMetadata")
            .field("default_value", &self.default_value)
            .field("affects", &self.affects)
            .field("has_coerce_callback", &self.coerce_callback.is_some())
            .finish()
    }
}

/// Builder for [`PropertyMetadata`].
pub struct PropertyMetadataBuilder<T: PropertyValue> {
    default_value: T,
    affects: Affects,
    coerce_callback: Option<CoerceValueCallback<T>>,
}

impl<T: PropertyValue> core::fmt::Debug for PropertyMetadataBuilder<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyMetadataBuilder")
            .field("default_value", &self.default_value)
            .field("affects", &self.affects)
            .field("has_coerce_callback", &self.coerce_callback.is_some())
            .finish()
    }
}

impl<T: PropertyValue> PropertyMetadataBuilder<T> {
    /// Starts a builder with the given default value.
    #[must_use]
    pub fn new(default_value: T) -> Self {
        Self {
            default_value,
            affects: Affects::empty(),
            coerce_callback: None,
        }
    }

    /// Adds passes that a change to this property invalidates.
    #[must_use]
    pub fn affects(mut self, affects: Affects) -> Self {
        self.affects |= affects;
        self
    }

    /// Sets an infallible coercion callback.
    #[must_use]
    pub fn coerce<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PropertyObject, T) -> T + 'static,
    {
        self.coerce_callback = Some(Box::new(move |owner, value| Ok(callback(owner, value))));
        self
    }

    /// Sets a coercion callback that may reject a value.
    ///
    /// A rejected write leaves the store untouched and surfaces as
    /// [`PropertyError::Coercion`](crate::PropertyError::Coercion).
    #[must_use]
    pub fn try_coerce<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PropertyObject, T) -> Result<T, CoerceError> + 'static,
    {
        self.coerce_callback = Some(Box::new(callback));
        self
    }

    /// Builds the [`PropertyMetadata`].
    #[must_use]
    pub fn build(self) -> PropertyMetadata<T> {
        PropertyMetadata {
            default_value: self.default_value,
            affects: self.affects,
            coerce_callback: self.coerce_callback,
        }
    }
}
