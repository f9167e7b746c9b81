// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-size leaf content.

use kurbo::Size;
use understory_property::{DependencyObject, PropertyError, PropertyObject};

use crate::control::Control;
use crate::layout::Layoutable;

/// A leaf with a fixed desired size, typically used as scrollable content.
#[derive(Debug)]
pub struct SizedBox {
    control: Control,
}

impl SizedBox {
    /// Creates a box that wants `size`.
    ///
    /// Negative or non-finite dimensions are stored as zero.
    #[must_use]
    pub fn new(size: Size) -> Self {
        let this = Self {
            control: Control::new::<Self>(),
        };
        if let Err(err) = this.set_size(size) {
            tracing::warn!(%err, "could not size box");
        }
        this
    }

    /// Returns `Width`.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.control.value(self.control.properties().width)
    }

    /// Returns `Height`.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.control.value(self.control.properties().height)
    }

    /// Sets `Width`.
    ///
    /// # Errors
    ///
    /// As for [`PropertyObject::set`].
    pub fn set_width(&self, width: f64) -> Result<bool, PropertyError> {
        self.control.object().set(self.control.properties().width, width)
    }

    /// Sets `Height`.
    ///
    /// # Errors
    ///
    /// As for [`PropertyObject::set`].
    pub fn set_height(&self, height: f64) -> Result<bool, PropertyError> {
        self.control.object().set(self.control.properties().height, height)
    }

    /// Sets both dimensions.
    ///
    /// # Errors
    ///
    /// As for [`PropertyObject::set`].
    pub fn set_size(&self, size: Size) -> Result<(), PropertyError> {
        self.set_width(size.width)?;
        self.set_height(size.height)?;
        Ok(())
    }
}

impl Layoutable for SizedBox {
    fn control(&self) -> &Control {
        &self.control
    }

    fn measure_override(&self, _available: Size) -> Size {
        Size::new(self.width(), self.height())
    }
}

impl DependencyObject for SizedBox {
    fn property_object(&self) -> &PropertyObject {
        self.control.object()
    }
}
