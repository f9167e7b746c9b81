// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Scroll: layout coordination and a property-driven scroll viewer.
//!
//! This crate combines [`understory_property`] and [`understory_binding`]
//! into a small control layer:
//!
//! - [`Control`] pairs a [`PropertyObject`](understory_property::PropertyObject)
//!   with layout bookkeeping. All controls share one registry per thread,
//!   see [`control_properties`].
//! - [`Layoutable`] and [`LayoutExt`] implement measure and arrange with
//!   caching. [`LayoutManager`] repeats passes until property changes stop
//!   invalidating the tree.
//! - [`ScrollViewer`] composes a [`ScrollContentPresenter`] and two
//!   [`ScrollBar`]s supplied as [`TemplateParts`], and keeps `Extent`,
//!   `Viewport`, `Offset` and the scroll bar values consistent purely through
//!   bindings and coercion.
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use kurbo::{Size, Vec2};
//! use understory_scroll::{Layoutable, LayoutManager, ScrollViewer, ScrollViewerOptions, SizedBox};
//!
//! let viewer = ScrollViewer::with_options(ScrollViewerOptions {
//!     scroll_bar_thickness: 0.0,
//!     ..ScrollViewerOptions::default()
//! });
//! viewer.apply_default_template().unwrap();
//! viewer.set_content(Some(Rc::new(SizedBox::new(Size::new(400.0, 100.0)))));
//!
//! let layout = LayoutManager::default();
//! layout.update(&viewer, Size::new(100.0, 100.0)).unwrap();
//! assert_eq!(viewer.extent(), Size::new(400.0, 100.0));
//!
//! // Dragging the horizontal thumb scrolls the content.
//! let bar = viewer.horizontal_scroll_bar().unwrap();
//! assert!(bar.control().is_visible());
//! bar.set_value(120.0).unwrap();
//! assert_eq!(viewer.offset(), Vec2::new(120.0, 0.0));
//!
//! // A wider viewport re-clamps the offset without an explicit write.
//! layout.update(&viewer, Size::new(350.0, 100.0)).unwrap();
//! assert_eq!(viewer.offset(), Vec2::new(50.0, 0.0));
//! ```
//!
//! Errors are reported through [`Error`]. Diagnostics go through `tracing`;
//! this crate never installs a subscriber.

mod axis;
mod control;
mod error;
mod layout;
mod presenter;
mod properties;
mod scroll_bar;
mod scroll_viewer;
mod sized_box;
mod template;

pub use axis::{
    Orientation, clamp_between, clamp_offset, finite_or_zero, is_scrollable, scroll_maximum,
    scroll_range, thumb_size,
};
pub use control::Control;
pub use error::{ConfigurationError, Error, LayoutError};
pub use layout::{LayoutExt, LayoutManager, LayoutOptions, LayoutSlot, LayoutState, Layoutable};
pub use presenter::ScrollContentPresenter;
pub use properties::{ControlProperties, control_properties};
pub use scroll_bar::{DEFAULT_SCROLL_BAR_THICKNESS, ScrollBar};
pub use scroll_viewer::{ScrollViewer, ScrollViewerOptions, ScrollViewerTemplate};
pub use sized_box::SizedBox;
pub use template::{
    HORIZONTAL_SCROLL_BAR_PART, PRESENTER_PART, TemplateParts, VERTICAL_SCROLL_BAR_PART,
};
