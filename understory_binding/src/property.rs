// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property change streams.

use understory_property::{Property, PropertyError, PropertyObject, PropertyValue};

use crate::observable::Observable;
use crate::subscription::Subscription;

/// Returns the stream of future values of `property` on `object`.
///
/// The stream holds `object` weakly; once the object is dropped new
/// subscriptions receive nothing.
///
/// # Errors
///
/// [`PropertyError::InvalidProperty`] if `property` cannot be used on `object`.
pub fn observe<T: PropertyValue>(
    object: &PropertyObject,
    property: Property<T>,
) -> Result<Observable<T>, PropertyError> {
    object.check(property)?;
    let weak = object.downgrade();
    Ok(Observable::new(move |observer| {
        let Some(object) = weak.upgrade() else {
            return Subscription::empty();
        };
        match object.subscribe(property, move |change| observer(change.new_value.clone())) {
            Ok(subscription) => subscription.into(),
            Err(err) => {
                tracing::warn!(%err, "property stream could not subscribe");
                Subscription::empty()
            }
        }
    }))
}

/// Like [`observe`], but every subscriber first receives the current value.
///
/// This is the form to feed into [`combine_latest2`](crate::combine_latest2)
/// so the combination emits immediately.
///
/// # Errors
///
/// [`PropertyError::InvalidProperty`] if `property` cannot be used on `object`.
pub fn observe_current<T: PropertyValue>(
    object: &PropertyObject,
    property: Property<T>,
) -> Result<Observable<T>, PropertyError> {
    let changes = observe(object, property)?;
    let weak = object.downgrade();
    Ok(Observable::new(move |observer| {
        let Some(object) = weak.upgrade() else {
            return Subscription::empty();
        };
        match object.get(property) {
            Ok(current) => changes.start_with(current).subscribe(move |v| observer(v)),
            Err(err) => {
                tracing::warn!(%err, "property stream could not read its current value");
                Subscription::empty()
            }
        }
    }))
}
