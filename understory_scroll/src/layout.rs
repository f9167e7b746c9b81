// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-pass layout: measure top-down, then arrange top-down.
//!
//! Each control keeps a [`LayoutSlot`]. Property changes flagged with
//! [`Affects::MEASURE`] or [`Affects::ARRANGE`] move the slot back to
//! [`LayoutState::Unmeasured`] or [`LayoutState::Measured`] the next time the
//! control's layout is consulted. A pass skips every subtree whose slot is
//! still valid for the same input.

use kurbo::{Point, Rect, Size};
use understory_property::Affects;

use crate::control::Control;
use crate::error::LayoutError;

/// Where a control is in the measure/arrange cycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayoutState {
    /// Needs a measure.
    #[default]
    Unmeasured,
    /// Measured; needs an arrange.
    Measured,
    /// Up to date until the next invalidation.
    Arranged,
}

/// Cached layout results of one control.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayoutSlot {
    /// Current state.
    pub state: LayoutState,
    /// Available size of the last measure, if any.
    pub available: Option<Size>,
    /// Result of the last measure.
    pub desired: Size,
    /// Rectangle of the last arrange.
    pub bounds: Rect,
}

impl Default for LayoutSlot {
    fn default() -> Self {
        Self {
            state: LayoutState::Unmeasured,
            available: None,
            desired: Size::ZERO,
            bounds: Rect::ZERO,
        }
    }
}

impl LayoutSlot {
    /// Applies the layout flags in `affects`.
    pub fn invalidate(&mut self, affects: Affects) {
        if affects.contains(Affects::MEASURE) {
            self.state = LayoutState::Unmeasured;
        } else if affects.contains(Affects::ARRANGE) && self.state == LayoutState::Arranged {
            self.state = LayoutState::Measured;
        }
    }
}

/// A control that takes part in layout.
///
/// Implementors provide [`control`](Self::control) and, if they have
/// children, [`visit_children`](Self::visit_children). The default overrides
/// size a control to the largest of its children and give every child the
/// full final rectangle.
pub trait Layoutable {
    /// Returns the shared control state.
    fn control(&self) -> &Control;

    /// Calls `visitor` with each child, in order.
    fn visit_children(&self, visitor: &mut dyn FnMut(&dyn Layoutable)) {
        let _ = visitor;
    }

    /// Computes the desired size for `available`.
    fn measure_override(&self, available: Size) -> Size {
        let mut desired = Size::ZERO;
        self.visit_children(&mut |child| {
            let size = child.measure(available);
            desired = Size::new(desired.width.max(size.width), desired.height.max(size.height));
        });
        desired
    }

    /// Positions children within `final_size` and returns the size used.
    fn arrange_override(&self, final_size: Size) -> Size {
        let rect = Rect::from_origin_size(Point::ZERO, final_size);
        self.visit_children(&mut |child| child.arrange(rect));
        final_size
    }
}

/// Layout entry points, available on every [`Layoutable`].
pub trait LayoutExt: Layoutable {
    /// Measures this control and returns its desired size.
    ///
    /// Skipped when the control and its visible descendants are still
    /// measured for the same `available` size. Invisible controls measure
    /// to zero without consulting their override.
    fn measure(&self, available: Size) -> Size;

    /// Arranges this control into `rect`, measuring it first if needed.
    fn arrange(&self, rect: Rect);

    /// Forces the next pass to measure this control.
    fn invalidate_measure(&self);

    /// Forces the next pass to arrange this control.
    fn invalidate_arrange(&self);

    /// Returns `true` if this control or a visible descendant is not arranged.
    fn needs_layout(&self) -> bool;
}

impl<L: Layoutable + ?Sized> LayoutExt for L {
    fn measure(&self, available: Size) -> Size {
        let control = self.control();
        let slot = control.slot();
        if slot.state != LayoutState::Unmeasured
            && slot.available == Some(available)
            && !children_need(self, LayoutState::Measured)
        {
            return slot.desired;
        }
        let desired = if control.is_visible() {
            self.measure_override(available)
        } else {
            Size::ZERO
        };
        tracing::trace!(
            owner = control.object().owner_name(),
            ?available,
            ?desired,
            "measured"
        );
        control.update_slot(|slot| {
            slot.state = LayoutState::Measured;
            slot.available = Some(available);
            slot.desired = desired;
        });
        desired
    }

    fn arrange(&self, rect: Rect) {
        let control = self.control();
        let slot = control.slot();
        if slot.state == LayoutState::Arranged
            && slot.bounds == rect
            && !children_need(self, LayoutState::Arranged)
        {
            return;
        }
        if slot.state == LayoutState::Unmeasured {
            self.measure(rect.size());
        }
        if control.is_visible() {
            self.arrange_override(rect.size());
        }
        tracing::trace!(owner = control.object().owner_name(), ?rect, "arranged");
        control.update_slot(|slot| {
            slot.state = LayoutState::Arranged;
            slot.bounds = rect;
        });
    }

    fn invalidate_measure(&self) {
        self.control().update_slot(|slot| slot.state = LayoutState::Unmeasured);
    }

    fn invalidate_arrange(&self) {
        self.control().update_slot(|slot| slot.invalidate(Affects::ARRANGE));
    }

    fn needs_layout(&self) -> bool {
        self.control().slot().state != LayoutState::Arranged
            || children_need(self, LayoutState::Arranged)
    }
}

/// Returns `true` if a visible descendant of `node` is below `at_least`.
fn children_need<L: Layoutable + ?Sized>(node: &L, at_least: LayoutState) -> bool {
    if !node.control().is_visible() {
        return false;
    }
    let mut dirty = false;
    node.visit_children(&mut |child| {
        dirty = dirty || child.control().slot().state < at_least || children_need(child, at_least);
    });
    dirty
}

/// Options for [`LayoutManager`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Measure/arrange passes to run before giving up.
    pub max_passes: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self { max_passes: 8 }
    }
}

/// Runs layout passes over a tree until it stops invalidating itself.
///
/// Arranging a scroll presenter updates `Extent` and `Viewport`, which can
/// show or hide scroll bars and so invalidate layout again. The manager
/// repeats measure and arrange until nothing is left invalid.
#[derive(Clone, Debug, Default)]
pub struct LayoutManager {
    options: LayoutOptions,
}

impl LayoutManager {
    /// Creates a manager with the given options.
    #[must_use]
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Lays `root` out into a rectangle of `available` size at the origin.
    ///
    /// Returns the number of passes it took.
    ///
    /// # Errors
    ///
    /// [`LayoutError::PassLimitExceeded`] if the tree is still invalid after
    /// [`LayoutOptions::max_passes`] passes.
    pub fn update<L: Layoutable + ?Sized>(
        &self,
        root: &L,
        available: Size,
    ) -> Result<usize, LayoutError> {
        let rect = Rect::from_origin_size(Point::ZERO, available);
        for pass in 1..=self.options.max_passes {
            root.measure(available);
            root.arrange(rect);
            if !root.needs_layout() {
                tracing::debug!(passes = pass, "layout settled");
                return Ok(pass);
            }
        }
        tracing::warn!(passes = self.options.max_passes, "layout did not settle");
        Err(LayoutError::PassLimitExceeded {
            passes: self.options.max_passes,
        })
    }
}
