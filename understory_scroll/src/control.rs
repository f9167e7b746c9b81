// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The state every control shares.

use std::cell::Cell;
use std::rc::Rc;

use kurbo::{Rect, Size};
use understory_property::{
    Affects, DependencyObject, Property, PropertyError, PropertyObject, PropertyValue,
};

use crate::layout::{LayoutSlot, LayoutState};
use crate::properties::{ControlProperties, control_properties};

/// Base of every control: its property object plus its layout bookkeeping.
///
/// `Control` is also the owner type of the properties all controls inherit,
/// such as `IsVisible`.
pub struct Control {
    object: PropertyObject,
    properties: Rc<ControlProperties>,
    slot: Cell<LayoutSlot>,
    seen: Cell<Affects>,
}

impl core::fmt::Debug for Control {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Control")
            .field("owner", &self.object.owner_name())
            .field("slot", &self.slot.get())
            .field("seen", &self.seen.get())
            .finish_non_exhaustive()
    }
}

impl Control {
    /// Creates the base state for a control whose concrete type is `O`.
    ///
    /// `O` decides which properties are valid on the object.
    #[must_use]
    pub fn new<O: 'static>() -> Self {
        let properties = control_properties();
        let object = PropertyObject::new::<O>(properties.registry().clone());
        Self {
            object,
            properties,
            slot: Cell::new(LayoutSlot::default()),
            seen: Cell::new(Affects::empty()),
        }
    }

    /// Returns the property handles.
    #[must_use]
    pub fn properties(&self) -> &ControlProperties {
        &self.properties
    }

    /// Returns the property object.
    #[must_use]
    pub fn object(&self) -> &PropertyObject {
        &self.object
    }

    /// Reads a property that is known to be valid on this control.
    ///
    /// # Panics
    ///
    /// If `property` is not registered for this control's type. The typed
    /// accessors on each control only pass their own properties.
    #[must_use]
    pub fn value<T: PropertyValue>(&self, property: Property<T>) -> T {
        match self.object.get(property) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Returns `IsVisible`.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.value(self.properties.is_visible)
    }

    /// Sets `IsVisible`. Returns `Ok(true)` if it changed.
    ///
    /// # Errors
    ///
    /// As for [`PropertyObject::set`].
    pub fn set_visible(&self, visible: bool) -> Result<bool, PropertyError> {
        self.object.set(self.properties.is_visible, visible)
    }

    /// Returns the current layout state, after folding in pending invalidation.
    #[must_use]
    pub fn layout_state(&self) -> LayoutState {
        self.slot().state
    }

    /// Returns the size reported by the last measure.
    #[must_use]
    pub fn desired_size(&self) -> Size {
        self.slot.get().desired
    }

    /// Returns the rectangle given to the last arrange, in parent coordinates.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.slot.get().bounds
    }

    /// Takes every [`Affects`] flag raised since the last call.
    ///
    /// Layout flags are applied to the layout state first, so a renderer
    /// taking them does not hide them from the next layout pass.
    pub fn take_invalidation(&self) -> Affects {
        self.absorb_invalidation();
        self.seen.replace(Affects::empty())
    }

    pub(crate) fn slot(&self) -> LayoutSlot {
        self.absorb_invalidation();
        self.slot.get()
    }

    pub(crate) fn update_slot(&self, f: impl FnOnce(&mut LayoutSlot)) {
        let mut slot = self.slot.get();
        f(&mut slot);
        self.slot.set(slot);
    }

    fn absorb_invalidation(&self) {
        let affects = self.object.take_invalidation();
        if affects.is_empty() {
            return;
        }
        self.seen.set(self.seen.get() | affects);
        self.update_slot(|slot| slot.invalidate(affects));
    }
}

impl DependencyObject for Control {
    fn property_object(&self) -> &PropertyObject {
        &self.object
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sized_box::SizedBox;

    #[test]
    fn visibility_defaults_on_and_invalidates_measure() {
        let control = Control::new::<SizedBox>();
        assert!(control.is_visible());
        control.update_slot(|slot| slot.state = LayoutState::Arranged);

        assert_eq!(control.set_visible(false), Ok(true));
        assert_eq!(control.layout_state(), LayoutState::Unmeasured);
        assert!(control.take_invalidation().contains(Affects::MEASURE | Affects::RENDER));
        assert!(control.take_invalidation().is_empty());
    }

    #[test]
    fn dependency_object_shorthands() {
        let control = Control::new::<SizedBox>();
        let visible = control.properties().is_visible;
        assert_eq!(control.set_value(visible, false), Ok(true));
        assert_eq!(control.get_value(visible), Ok(false));
        assert_eq!(control.clear_value(visible), Ok(true));
        assert!(control.is_visible());
    }

    #[test]
    #[should_panic(expected = "is not valid on")]
    fn reading_a_foreign_property_panics() {
        let control = Control::new::<SizedBox>();
        let offset = control.properties().offset;
        let _ = control.value(offset);
    }
}
