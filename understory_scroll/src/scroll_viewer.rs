// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scroll viewer and its default template.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use kurbo::{Rect, Size, Vec2};
use understory_binding::{Binding, Subscription, bind, combine_latest2, observe_current};
use understory_property::{Property, PropertyError, PropertyObject};

use crate::axis::{
    Orientation, finite_or_zero, is_scrollable, scroll_maximum, scroll_range, thumb_size,
};
use crate::control::Control;
use crate::error::Error;
use crate::layout::{LayoutExt, Layoutable};
use crate::presenter::ScrollContentPresenter;
use crate::scroll_bar::{DEFAULT_SCROLL_BAR_THICKNESS, ScrollBar};
use crate::template::{
    HORIZONTAL_SCROLL_BAR_PART, PRESENTER_PART, TemplateParts, VERTICAL_SCROLL_BAR_PART,
};

/// Tuning for [`ScrollViewer`] and its default template.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScrollViewerOptions {
    /// Distance moved by the line operations.
    pub line_size: f64,
    /// Cross-axis size of the scroll bars in the default template.
    pub scroll_bar_thickness: f64,
}

impl Default for ScrollViewerOptions {
    fn default() -> Self {
        Self {
            line_size: 16.0,
            scroll_bar_thickness: DEFAULT_SCROLL_BAR_THICKNESS,
        }
    }
}

/// Builds the standard parts of a [`ScrollViewer`].
#[derive(Clone, Debug, Default)]
pub struct ScrollViewerTemplate {
    options: ScrollViewerOptions,
}

impl ScrollViewerTemplate {
    /// Creates a template using `options` for the scroll bars.
    #[must_use]
    pub fn new(options: ScrollViewerOptions) -> Self {
        Self { options }
    }

    /// Instantiates a presenter and two scroll bars under their part names.
    #[must_use]
    pub fn instantiate(&self) -> TemplateParts {
        let thickness = self.options.scroll_bar_thickness;
        TemplateParts::new()
            .with(PRESENTER_PART, Rc::new(ScrollContentPresenter::new()))
            .with(
                HORIZONTAL_SCROLL_BAR_PART,
                Rc::new(ScrollBar::with_thickness(Orientation::Horizontal, thickness)),
            )
            .with(
                VERTICAL_SCROLL_BAR_PART,
                Rc::new(ScrollBar::with_thickness(Orientation::Vertical, thickness)),
            )
    }
}

struct AppliedTemplate {
    presenter: Rc<ScrollContentPresenter>,
    horizontal: Rc<ScrollBar>,
    vertical: Rc<ScrollBar>,
    bindings: Vec<Binding>,
    subscriptions: Vec<Subscription>,
}

/// A control that scrolls its content.
///
/// The viewer does no layout math of its own. Its template's
/// [`ScrollContentPresenter`] measures the content and publishes `Extent` and
/// `Viewport`; bindings set up by [`apply_template`](Self::apply_template)
/// mirror those onto the viewer, derive both scroll bars' range, visibility
/// and thumb size, and keep `Offset` and the scroll bar values in step.
///
/// `Offset` is always within `[0, Extent − Viewport]` on each axis, and is
/// re-clamped whenever `Extent` or `Viewport` changes.
///
/// ```rust
/// use std::rc::Rc;
/// use kurbo::{Size, Vec2};
/// use understory_scroll::{LayoutManager, ScrollViewer, SizedBox};
///
/// let viewer = ScrollViewer::new();
/// viewer.apply_default_template().unwrap();
/// viewer.set_content(Some(Rc::new(SizedBox::new(Size::new(50.0, 1000.0)))));
/// LayoutManager::default().update(&viewer, Size::new(100.0, 200.0)).unwrap();
///
/// viewer.set_offset(Vec2::new(0.0, 5000.0)).unwrap();
/// assert_eq!(viewer.offset(), Vec2::new(0.0, 800.0));
/// let bar = viewer.vertical_scroll_bar().unwrap();
/// assert_eq!(bar.value(), 800.0);
/// ```
pub struct ScrollViewer {
    control: Control,
    options: ScrollViewerOptions,
    content: RefCell<Option<Rc<dyn Layoutable>>>,
    template: RefCell<Option<AppliedTemplate>>,
}

impl fmt::Debug for ScrollViewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollViewer")
            .field("control", &self.control)
            .field("options", &self.options)
            .field("has_content", &self.content.borrow().is_some())
            .field("has_template", &self.template.borrow().is_some())
            .finish()
    }
}

impl Default for ScrollViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollViewer {
    /// Creates a viewer with default options and no template.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ScrollViewerOptions::default())
    }

    /// Creates a viewer with the given options and no template.
    #[must_use]
    pub fn with_options(options: ScrollViewerOptions) -> Self {
        Self {
            control: Control::new::<Self>(),
            options,
            content: RefCell::new(None),
            template: RefCell::new(None),
        }
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &ScrollViewerOptions {
        &self.options
    }

    /// Returns `Extent`, the size of the content.
    #[must_use]
    pub fn extent(&self) -> Size {
        self.control.value(self.control.properties().extent)
    }

    /// Returns `Viewport`, the size of the visible area.
    #[must_use]
    pub fn viewport(&self) -> Size {
        self.control.value(self.control.properties().viewport)
    }

    /// Returns `Offset`, the scrolled distance.
    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.control.value(self.control.properties().offset)
    }

    /// Sets `Offset`, clamped to the scrollable range.
    ///
    /// # Errors
    ///
    /// As for [`PropertyObject::set`].
    pub fn set_offset(&self, offset: Vec2) -> Result<bool, PropertyError> {
        self.control.object().set(self.control.properties().offset, offset)
    }

    /// Largest valid `Offset`.
    #[must_use]
    pub fn max_offset(&self) -> Vec2 {
        let (extent, viewport) = (self.extent(), self.viewport());
        Vec2::new(
            scroll_maximum(extent.width, viewport.width),
            scroll_maximum(extent.height, viewport.height),
        )
    }

    /// Returns the content.
    #[must_use]
    pub fn content(&self) -> Option<Rc<dyn Layoutable>> {
        self.content.borrow().clone()
    }

    /// Replaces the content, forwarding it to the presenter if a template is
    /// applied.
    pub fn set_content(&self, content: Option<Rc<dyn Layoutable>>) {
        *self.content.borrow_mut() = content.clone();
        if let Some(presenter) = self.presenter() {
            presenter.set_content(content);
        }
        self.invalidate_measure();
    }

    /// Returns the template's presenter.
    #[must_use]
    pub fn presenter(&self) -> Option<Rc<ScrollContentPresenter>> {
        self.template.borrow().as_ref().map(|t| t.presenter.clone())
    }

    /// Returns the template's horizontal scroll bar.
    #[must_use]
    pub fn horizontal_scroll_bar(&self) -> Option<Rc<ScrollBar>> {
        self.template.borrow().as_ref().map(|t| t.horizontal.clone())
    }

    /// Returns the template's vertical scroll bar.
    #[must_use]
    pub fn vertical_scroll_bar(&self) -> Option<Rc<ScrollBar>> {
        self.template.borrow().as_ref().map(|t| t.vertical.clone())
    }

    /// Applies a [`ScrollViewerTemplate`] built from this viewer's options.
    ///
    /// # Errors
    ///
    /// As for [`apply_template`](Self::apply_template).
    pub fn apply_default_template(&self) -> Result<(), Error> {
        self.apply_template(&ScrollViewerTemplate::new(self.options).instantiate())
    }

    /// Resolves the template parts and wires them to this viewer.
    ///
    /// Any previously applied template is detached first. On failure nothing
    /// stays connected.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError`](crate::ConfigurationError) if the `presenter`,
    ///   `horizontalScrollBar` or `verticalScrollBar` part is missing or has
    ///   the wrong type.
    /// - [`PropertyError`] if an initial write fails.
    pub fn apply_template(&self, parts: &TemplateParts) -> Result<(), Error> {
        self.detach_template();

        let presenter = parts.require::<ScrollContentPresenter>(PRESENTER_PART)?;
        let horizontal = parts.require::<ScrollBar>(HORIZONTAL_SCROLL_BAR_PART)?;
        let vertical = parts.require::<ScrollBar>(VERTICAL_SCROLL_BAR_PART)?;

        let props = self.control.properties();
        let viewer = self.control.object();
        let presenter_object = presenter.control().object();
        let mut bindings = Vec::new();

        // Extent and Viewport flow up from the presenter; Offset flows down.
        bindings.push(bind(
            viewer,
            props.extent,
            &observe_current(presenter_object, props.presenter_extent)?,
        )?);
        bindings.push(bind(
            viewer,
            props.viewport,
            &observe_current(presenter_object, props.presenter_viewport)?,
        )?);
        bindings.push(bind(
            presenter_object,
            props.presenter_offset,
            &observe_current(viewer, props.offset)?,
        )?);

        let sizes = combine_latest2(
            &observe_current(viewer, props.extent)?,
            &observe_current(viewer, props.viewport)?,
        );
        for bar in [&horizontal, &vertical] {
            let axis = bar.orientation();
            let object = bar.control().object();
            bindings.push(bind(
                object,
                props.is_visible,
                &sizes
                    .select(move |(e, v)| is_scrollable(axis.length(e), axis.length(v)))
                    .distinct_until_changed(),
            )?);
            bindings.push(bind(
                object,
                props.maximum,
                &sizes.select(move |(e, v)| scroll_range(axis.length(e), axis.length(v))),
            )?);
            bindings.push(bind(
                object,
                props.viewport_size,
                &sizes.select(move |(e, v)| thumb_size(axis.length(e), axis.length(v))),
            )?);
        }

        // Offset changes that did not come from a drag still move the thumbs.
        let thumbs = offset_to_thumbs(props.value, &horizontal, &vertical);
        let subscriptions =
            vec![observe_current(presenter_object, props.presenter_offset)?.subscribe(thumbs)];

        bindings.push(bind(
            viewer,
            props.offset,
            &combine_latest2(
                &observe_current(horizontal.control().object(), props.value)?,
                &observe_current(vertical.control().object(), props.value)?,
            )
            .select(|(x, y)| Vec2::new(x, y)),
        )?);

        presenter.set_content(self.content());
        tracing::debug!(
            bindings = bindings.len(),
            extent = ?self.extent(),
            viewport = ?self.viewport(),
            "scroll viewer template applied"
        );
        *self.template.borrow_mut() = Some(AppliedTemplate {
            presenter,
            horizontal,
            vertical,
            bindings,
            subscriptions,
        });
        self.invalidate_measure();
        Ok(())
    }

    /// Disconnects the applied template, if any. Returns `true` if there was one.
    ///
    /// The parts keep their last values but no longer follow the viewer.
    pub fn detach_template(&self) -> bool {
        let Some(mut applied) = self.template.borrow_mut().take() else {
            return false;
        };
        for binding in &mut applied.bindings {
            binding.dispose();
        }
        for subscription in &mut applied.subscriptions {
            subscription.dispose();
        }
        applied.presenter.set_content(None);
        tracing::debug!("scroll viewer template detached");
        self.invalidate_measure();
        true
    }

    /// Scrolls by `delta`.
    ///
    /// # Errors
    ///
    /// As for [`set_offset`](Self::set_offset).
    pub fn scroll_by(&self, delta: Vec2) -> Result<bool, PropertyError> {
        self.set_offset(self.offset() + delta)
    }

    /// Scrolls to the top-left corner.
    ///
    /// # Errors
    ///
    /// As for [`set_offset`](Self::set_offset).
    pub fn scroll_to_home(&self) -> Result<bool, PropertyError> {
        self.set_offset(Vec2::ZERO)
    }

    /// Scrolls to the bottom-right corner.
    ///
    /// # Errors
    ///
    /// As for [`set_offset`](Self::set_offset).
    pub fn scroll_to_end(&self) -> Result<bool, PropertyError> {
        self.set_offset(self.max_offset())
    }

    /// Scrolls up by one line.
    ///
    /// # Errors
    ///
    /// As for [`set_offset`](Self::set_offset).
    pub fn line_up(&self) -> Result<bool, PropertyError> {
        self.scroll_by(Vec2::new(0.0, -self.options.line_size))
    }

    /// Scrolls down by one line.
    ///
    /// # Errors
    ///
    /// As for [`set_offset`](Self::set_offset).
    pub fn line_down(&self) -> Result<bool, PropertyError> {
        self.scroll_by(Vec2::new(0.0, self.options.line_size))
    }

    /// Scrolls left by one line.
    ///
    /// # Errors
    ///
    /// As for [`set_offset`](Self::set_offset).
    pub fn line_left(&self) -> Result<bool, PropertyError> {
        self.scroll_by(Vec2::new(-self.options.line_size, 0.0))
    }

    /// Scrolls right by one line.
    ///
    /// # Errors
    ///
    /// As for [`set_offset`](Self::set_offset).
    pub fn line_right(&self) -> Result<bool, PropertyError> {
        self.scroll_by(Vec2::new(self.options.line_size, 0.0))
    }

    /// Scrolls up by one viewport height.
    ///
    /// # Errors
    ///
    /// As for [`set_offset`](Self::set_offset).
    pub fn page_up(&self) -> Result<bool, PropertyError> {
        self.scroll_by(Vec2::new(0.0, -self.viewport().height))
    }

    /// Scrolls down by one viewport height.
    ///
    /// # Errors
    ///
    /// As for [`set_offset`](Self::set_offset).
    pub fn page_down(&self) -> Result<bool, PropertyError> {
        self.scroll_by(Vec2::new(0.0, self.viewport().height))
    }

    /// Scrolls left by one viewport width.
    ///
    /// # Errors
    ///
    /// As for [`set_offset`](Self::set_offset).
    pub fn page_left(&self) -> Result<bool, PropertyError> {
        self.scroll_by(Vec2::new(-self.viewport().width, 0.0))
    }

    /// Scrolls right by one viewport width.
    ///
    /// # Errors
    ///
    /// As for [`set_offset`](Self::set_offset).
    pub fn page_right(&self) -> Result<bool, PropertyError> {
        self.scroll_by(Vec2::new(self.viewport().width, 0.0))
    }

    fn parts(&self) -> Option<(Rc<ScrollContentPresenter>, Rc<ScrollBar>, Rc<ScrollBar>)> {
        self.template.borrow().as_ref().map(|t| {
            (
                t.presenter.clone(),
                t.horizontal.clone(),
                t.vertical.clone(),
            )
        })
    }
}

/// Writes presenter offsets straight into the scroll bar values.
fn offset_to_thumbs(
    value: Property<f64>,
    horizontal: &ScrollBar,
    vertical: &ScrollBar,
) -> impl Fn(Vec2) + 'static {
    let bars = [
        (horizontal.control().object().downgrade(), Orientation::Horizontal),
        (vertical.control().object().downgrade(), Orientation::Vertical),
    ];
    move |offset: Vec2| {
        for (bar, axis) in &bars {
            let Some(bar) = bar.upgrade() else {
                continue;
            };
            write_thumb(&bar, value, axis.component(offset));
        }
    }
}

fn write_thumb(bar: &PropertyObject, value: Property<f64>, position: f64) {
    if let Err(err) = bar.set(value, position) {
        tracing::warn!(%err, "could not move scroll bar thumb");
    }
}

impl Layoutable for ScrollViewer {
    fn control(&self) -> &Control {
        &self.control
    }

    fn visit_children(&self, visitor: &mut dyn FnMut(&dyn Layoutable)) {
        if let Some((presenter, horizontal, vertical)) = self.parts() {
            visitor(&*presenter);
            visitor(&*horizontal);
            visitor(&*vertical);
        }
    }

    fn arrange_override(&self, final_size: Size) -> Size {
        let Some((presenter, horizontal, vertical)) = self.parts() else {
            return final_size;
        };
        let band = |bar: &ScrollBar| {
            if bar.control().is_visible() {
                bar.thickness()
            } else {
                0.0
            }
        };
        // Arranging the presenter can show or hide either bar, which changes
        // the room left for it. Bars only flip a bounded number of times.
        let room = |(h_band, v_band): (f64, f64)| {
            (
                finite_or_zero(final_size.width - v_band),
                finite_or_zero(final_size.height - h_band),
            )
        };
        let mut bands = (band(&horizontal), band(&vertical));
        for _ in 0..3 {
            let (width, height) = room(bands);
            presenter.arrange(Rect::new(0.0, 0.0, width, height));
            let now = (band(&horizontal), band(&vertical));
            if now == bands {
                break;
            }
            bands = now;
        }
        let (width, height) = room(bands);
        horizontal.arrange(Rect::new(0.0, height, width, height + bands.0));
        vertical.arrange(Rect::new(width, 0.0, width + bands.1, height));
        final_size
    }
}
