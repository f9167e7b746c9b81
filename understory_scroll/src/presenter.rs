// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The part of a scroll viewer that hosts and offsets its content.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use kurbo::{Point, Rect, Size, Vec2};
use understory_property::PropertyError;

use crate::control::Control;
use crate::layout::{LayoutExt, Layoutable};

/// Hosts scrollable content and reports how much of it fits.
///
/// Content is measured with unbounded space. On arrange the presenter places
/// it at `-Offset` and publishes `Viewport` (its own final size) and `Extent`
/// (the content's desired size).
pub struct ScrollContentPresenter {
    control: Control,
    content: RefCell<Option<Rc<dyn Layoutable>>>,
}

impl fmt::Debug for ScrollContentPresenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollContentPresenter")
            .field("control", &self.control)
            .field("has_content", &self.content.borrow().is_some())
            .finish()
    }
}

impl Default for ScrollContentPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollContentPresenter {
    /// Creates an empty presenter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            control: Control::new::<Self>(),
            content: RefCell::new(None),
        }
    }

    /// Returns the hosted content.
    #[must_use]
    pub fn content(&self) -> Option<Rc<dyn Layoutable>> {
        self.content.borrow().clone()
    }

    /// Replaces the hosted content.
    pub fn set_content(&self, content: Option<Rc<dyn Layoutable>>) {
        *self.content.borrow_mut() = content;
        self.invalidate_measure();
    }

    /// Returns `Extent`.
    #[must_use]
    pub fn extent(&self) -> Size {
        self.control.value(self.control.properties().presenter_extent)
    }

    /// Returns `Viewport`.
    #[must_use]
    pub fn viewport(&self) -> Size {
        self.control.value(self.control.properties().presenter_viewport)
    }

    /// Returns `Offset`.
    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.control.value(self.control.properties().presenter_offset)
    }

    /// Sets `Extent`. Arrange normally does this.
    ///
    /// # Errors
    ///
    /// As for [`PropertyObject::set`](understory_property::PropertyObject::set).
    pub fn set_extent(&self, extent: Size) -> Result<bool, PropertyError> {
        let property = self.control.properties().presenter_extent;
        self.control.object().set(property, extent)
    }

    /// Sets `Viewport`. Arrange normally does this.
    ///
    /// # Errors
    ///
    /// As for [`PropertyObject::set`](understory_property::PropertyObject::set).
    pub fn set_viewport(&self, viewport: Size) -> Result<bool, PropertyError> {
        let property = self.control.properties().presenter_viewport;
        self.control.object().set(property, viewport)
    }

    /// Sets `Offset`.
    ///
    /// # Errors
    ///
    /// As for [`PropertyObject::set`](understory_property::PropertyObject::set).
    pub fn set_offset(&self, offset: Vec2) -> Result<bool, PropertyError> {
        let property = self.control.properties().presenter_offset;
        self.control.object().set(property, offset)
    }
}

impl Layoutable for ScrollContentPresenter {
    fn control(&self) -> &Control {
        &self.control
    }

    fn visit_children(&self, visitor: &mut dyn FnMut(&dyn Layoutable)) {
        if let Some(content) = self.content() {
            visitor(&*content);
        }
    }

    fn measure_override(&self, available: Size) -> Size {
        let Some(content) = self.content() else {
            return Size::ZERO;
        };
        let desired = content.measure(Size::new(f64::INFINITY, f64::INFINITY));
        Size::new(
            desired.width.min(available.width),
            desired.height.min(available.height),
        )
    }

    fn arrange_override(&self, final_size: Size) -> Size {
        let extent = match self.content() {
            Some(content) => {
                let desired = content.control().desired_size();
                let offset = self.offset();
                let size = Size::new(
                    desired.width.max(final_size.width),
                    desired.height.max(final_size.height),
                );
                content.arrange(Rect::from_origin_size(Point::new(-offset.x, -offset.y), size));
                desired
            }
            None => Size::ZERO,
        };
        if let Err(err) = self.set_viewport(final_size) {
            tracing::warn!(%err, "presenter could not publish its viewport");
        }
        if let Err(err) = self.set_extent(extent) {
            tracing::warn!(%err, "presenter could not publish its extent");
        }
        final_size
    }
}
