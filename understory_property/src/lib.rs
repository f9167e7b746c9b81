// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Property: reactive dependency properties.
//!
//! This crate is the bottom layer of the Understory control stack. It
//! provides typed properties registered per owner type, per-object sparse
//! storage, coercion, change notification, and the "affects" annotations that
//! tie property changes to coercion and layout invalidation.
//!
//! ## Core Concepts
//!
//! - [`PropertyRegistry`] maps (owner type, name) to a typed [`Property<T>`]
//!   handle and its [`PropertyMetadata`]. It is filled once and then shared
//!   read-only behind an `Rc`.
//! - [`PropertyObject`] is one object's property table. Every write goes
//!   through coercion and is dropped if it would not change the stored value,
//!   so no notification fires for no-op writes.
//! - [`PropertyRegistry::affects_coercion`] makes one property's change
//!   re-run another property's coercion (an offset re-clamped when its extent
//!   shrinks). [`Affects`] flags record layout and render invalidation.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use understory_property::{Affects, PropertyMetadataBuilder, PropertyObject, PropertyRegistry};
//!
//! struct Gauge;
//!
//! let mut registry = PropertyRegistry::new();
//! let maximum = registry.register::<Gauge, f64>(
//!     "Maximum",
//!     PropertyMetadataBuilder::new(10.0).affects(Affects::ARRANGE).build(),
//! );
//! let level = registry.register::<Gauge, f64>(
//!     "Level",
//!     PropertyMetadataBuilder::new(0.0)
//!         .coerce(move |gauge, v: f64| v.clamp(0.0, gauge.get(maximum).unwrap_or(0.0)))
//!         .build(),
//! );
//! registry.affects_coercion(maximum, level);
//!
//! let gauge = PropertyObject::new::<Gauge>(Rc::new(registry));
//! gauge.set(level, 8.0).unwrap();
//! gauge.set(maximum, 5.0).unwrap();
//! assert_eq!(gauge.get(level), Ok(5.0));
//! assert!(gauge.take_invalidation().contains(Affects::ARRANGE));
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod affects;
mod error;
mod id;
mod metadata;
mod object;
mod registry;
mod store;
mod value;

pub use affects::Affects;
pub use error::{CoerceError, PropertyError};
pub use id::{Property, PropertyId};
pub use metadata::{CoerceValueCallback, PropertyMetadata, PropertyMetadataBuilder};
pub use object::{
    ChangeSubscription, DependencyObject, PropertyChanged, PropertyObject, WeakPropertyObject,
};
pub use registry::{PropertyRegistration, PropertyRegistry};
pub use store::PropertyStore;
pub use value::{ErasedValue, PropertyValue};
