// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll bars.

use kurbo::Size;
use understory_property::PropertyError;

use crate::axis::{Orientation, finite_or_zero};
use crate::control::Control;
use crate::layout::Layoutable;

/// Default cross-axis size of a scroll bar.
pub const DEFAULT_SCROLL_BAR_THICKNESS: f64 = 12.0;

/// A range control with a draggable thumb.
///
/// `Value` always lies within `[Minimum, Maximum]`; changing either bound
/// re-clamps it. Input handling is external and ends in
/// [`set_value`](Self::set_value).
#[derive(Debug)]
pub struct ScrollBar {
    control: Control,
    orientation: Orientation,
    thickness: f64,
}

impl ScrollBar {
    /// Creates a scroll bar of the default thickness.
    #[must_use]
    pub fn new(orientation: Orientation) -> Self {
        Self::with_thickness(orientation, DEFAULT_SCROLL_BAR_THICKNESS)
    }

    /// Creates a scroll bar measuring `thickness` across its axis.
    #[must_use]
    pub fn with_thickness(orientation: Orientation, thickness: f64) -> Self {
        Self {
            control: Control::new::<Self>(),
            orientation,
            thickness: finite_or_zero(thickness),
        }
    }

    /// Returns the axis this bar scrolls.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Returns the cross-axis size.
    #[must_use]
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Returns `Minimum`.
    #[must_use]
    pub fn minimum(&self) -> f64 {
        self.control.value(self.control.properties().minimum)
    }

    /// Returns `Maximum`.
    #[must_use]
    pub fn maximum(&self) -> f64 {
        self.control.value(self.control.properties().maximum)
    }

    /// Returns `Value`.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.control.value(self.control.properties().value)
    }

    /// Returns `ViewportSize`.
    #[must_use]
    pub fn viewport_size(&self) -> f64 {
        self.control.value(self.control.properties().viewport_size)
    }

    /// Sets `Minimum`, re-clamping `Value`.
    ///
    /// # Errors
    ///
    /// As for [`PropertyObject::set`](understory_property::PropertyObject::set).
    pub fn set_minimum(&self, minimum: f64) -> Result<bool, PropertyError> {
        self.control.object().set(self.control.properties().minimum, minimum)
    }

    /// Sets `Maximum`, re-clamping `Value`.
    ///
    /// # Errors
    ///
    /// As for [`PropertyObject::set`](understory_property::PropertyObject::set).
    pub fn set_maximum(&self, maximum: f64) -> Result<bool, PropertyError> {
        self.control.object().set(self.control.properties().maximum, maximum)
    }

    /// Sets `Value`, clamped into the range.
    ///
    /// # Errors
    ///
    /// As for [`PropertyObject::set`](understory_property::PropertyObject::set).
    pub fn set_value(&self, value: f64) -> Result<bool, PropertyError> {
        self.control.object().set(self.control.properties().value, value)
    }

    /// Sets `ViewportSize`.
    ///
    /// # Errors
    ///
    /// As for [`PropertyObject::set`](understory_property::PropertyObject::set).
    pub fn set_viewport_size(&self, size: f64) -> Result<bool, PropertyError> {
        self.control.object().set(self.control.properties().viewport_size, size)
    }

    /// Thumb length on a track of `track_length` pixels.
    ///
    /// The thumb covers `ViewportSize / (Maximum − Minimum + ViewportSize)`
    /// of the track. Empty ranges and tracks give `0.0`.
    ///
    /// ```rust
    /// use understory_scroll::{Orientation, ScrollBar};
    ///
    /// let bar = ScrollBar::new(Orientation::Vertical);
    /// bar.set_maximum(300.0).unwrap();
    /// bar.set_viewport_size(100.0).unwrap();
    /// assert_eq!(bar.thumb_length(200.0), 50.0);
    /// ```
    #[must_use]
    pub fn thumb_length(&self, track_length: f64) -> f64 {
        let track = finite_or_zero(track_length);
        let range = finite_or_zero(self.maximum() - self.minimum());
        let viewport = self.viewport_size();
        finite_or_zero(track * viewport / (range + viewport)).min(track)
    }
}

impl Layoutable for ScrollBar {
    fn control(&self) -> &Control {
        &self.control
    }

    fn measure_override(&self, _available: Size) -> Size {
        match self.orientation {
            Orientation::Horizontal => Size::new(0.0, self.thickness),
            Orientation::Vertical => Size::new(self.thickness, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_stays_in_range() {
        let bar = ScrollBar::new(Orientation::Horizontal);
        assert_eq!(bar.maximum(), 100.0);
        bar.set_value(150.0).unwrap();
        assert_eq!(bar.value(), 100.0);
        bar.set_value(-1.0).unwrap();
        assert_eq!(bar.value(), 0.0);
    }

    #[test]
    fn shrinking_the_range_reclamps() {
        let bar = ScrollBar::new(Orientation::Vertical);
        bar.set_value(80.0).unwrap();
        bar.set_maximum(50.0).unwrap();
        assert_eq!(bar.value(), 50.0);
        bar.set_minimum(60.0).unwrap();
        assert_eq!(bar.value(), 60.0);
    }

    #[test]
    fn degenerate_thumbs_are_empty() {
        let bar = ScrollBar::new(Orientation::Horizontal);
        bar.set_maximum(0.0).unwrap();
        assert_eq!(bar.thumb_length(100.0), 0.0);
        bar.set_viewport_size(f64::NAN).unwrap();
        assert_eq!(bar.viewport_size(), 0.0);
        assert_eq!(bar.thumb_length(f64::INFINITY), 0.0);
    }

    #[test]
    fn thickness_is_cross_axis() {
        use crate::layout::LayoutExt;
        let bar = ScrollBar::with_thickness(Orientation::Vertical, 8.0);
        assert_eq!(bar.measure(Size::new(50.0, 50.0)), Size::new(8.0, 0.0));
    }
}
