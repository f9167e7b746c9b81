// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Binding: observables and property bindings.
//!
//! This crate sits on top of [`understory_property`]. It turns property
//! changes into push-based [`Observable`] sequences, combines them, and
//! writes the results back into properties through [`Binding`]s.
//!
//! ## Core Concepts
//!
//! - [`Observable<T>`] is lazy and synchronous. Each [`subscribe`](Observable::subscribe)
//!   call is independent and returns a [`Subscription`] that disposes on drop.
//! - [`observe`] yields a property's future values; [`observe_current`] first
//!   replays the value current at subscribe time.
//! - [`combine_latest2`] and [`combine_latest`] wait for every input and then
//!   emit on each input change. [`Observable::select`] maps and
//!   [`Observable::start_with`] primes.
//! - [`bind`], [`bind_one_way`] and [`bind_two_way`] write values into
//!   properties. Two-way bindings rely on properties not notifying for
//!   equal values; there is no separate cycle detection.
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use understory_binding::{bind, combine_latest2, observe_current};
//! use understory_property::{PropertyMetadata, PropertyObject, PropertyRegistry};
//!
//! struct Panel;
//!
//! let mut registry = PropertyRegistry::new();
//! let extent = registry.register::<Panel, f64>("Extent", PropertyMetadata::new(0.0));
//! let viewport = registry.register::<Panel, f64>("Viewport", PropertyMetadata::new(0.0));
//! let overflow = registry.register::<Panel, bool>("Overflow", PropertyMetadata::new(false));
//! let panel = PropertyObject::new::<Panel>(Rc::new(registry));
//!
//! let source = combine_latest2(
//!     &observe_current(&panel, extent).unwrap(),
//!     &observe_current(&panel, viewport).unwrap(),
//! )
//! .select(|(e, v)| e > v);
//! let _binding = bind(&panel, overflow, &source).unwrap();
//!
//! panel.set(extent, 300.0).unwrap();
//! assert_eq!(panel.get(overflow), Ok(true));
//! panel.set(viewport, 400.0).unwrap();
//! assert_eq!(panel.get(overflow), Ok(false));
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod binding;
mod combine;
mod observable;
mod property;
mod publisher;
mod subscription;

pub use binding::{Binding, bind, bind_one_way, bind_two_way};
pub use combine::{combine_latest, combine_latest2};
pub use observable::{Observable, Observer};
pub use property::{observe, observe_current};
pub use publisher::Publisher;
pub use subscription::Subscription;
