// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared property registry for this crate's controls.

use std::rc::Rc;

use kurbo::{Size, Vec2};
use understory_property::{
    Affects, Property, PropertyMetadata, PropertyMetadataBuilder, PropertyRegistry,
};

use crate::axis::{clamp_between, clamp_offset, finite_or_zero};
use crate::control::Control;
use crate::presenter::ScrollContentPresenter;
use crate::scroll_bar::ScrollBar;
use crate::scroll_viewer::ScrollViewer;
use crate::sized_box::SizedBox;

/// Registered property handles for every control in this crate.
///
/// The registry is built once per thread and shared by all controls; get it
/// from [`control_properties`].
#[derive(Debug)]
#[non_exhaustive]
pub struct ControlProperties {
    registry: Rc<PropertyRegistry>,
    /// `Control.IsVisible`, default `true`. Affects measure.
    pub is_visible: Property<bool>,
    /// `SizedBox.Width`. Affects measure.
    pub width: Property<f64>,
    /// `SizedBox.Height`. Affects measure.
    pub height: Property<f64>,
    /// `ScrollBar.Minimum`, default `0`.
    pub minimum: Property<f64>,
    /// `ScrollBar.Maximum`, default `100`.
    pub maximum: Property<f64>,
    /// `ScrollBar.Value`, coerced into `[Minimum, Maximum]`.
    pub value: Property<f64>,
    /// `ScrollBar.ViewportSize`, never negative.
    pub viewport_size: Property<f64>,
    /// `ScrollContentPresenter.Extent`.
    pub presenter_extent: Property<Size>,
    /// `ScrollContentPresenter.Viewport`.
    pub presenter_viewport: Property<Size>,
    /// `ScrollContentPresenter.Offset`. Affects arrange.
    pub presenter_offset: Property<Vec2>,
    /// `ScrollViewer.Extent`.
    pub extent: Property<Size>,
    /// `ScrollViewer.Viewport`.
    pub viewport: Property<Size>,
    /// `ScrollViewer.Offset`, clamped to the scrollable range.
    pub offset: Property<Vec2>,
}

impl ControlProperties {
    fn register() -> Self {
        let mut registry = PropertyRegistry::new();
        registry.derive::<SizedBox, Control>();
        registry.derive::<ScrollBar, Control>();
        registry.derive::<ScrollContentPresenter, Control>();
        registry.derive::<ScrollViewer, Control>();

        let is_visible = registry.register::<Control, bool>(
            "IsVisible",
            PropertyMetadataBuilder::new(true)
                .affects(Affects::MEASURE | Affects::RENDER)
                .build(),
        );

        let length = || {
            PropertyMetadataBuilder::new(0.0)
                .coerce(|_, v: f64| finite_or_zero(v))
                .affects(Affects::MEASURE)
                .build()
        };
        let width = registry.register::<SizedBox, f64>("Width", length());
        let height = registry.register::<SizedBox, f64>("Height", length());

        let minimum = registry.register::<ScrollBar, f64>("Minimum", PropertyMetadata::new(0.0));
        let maximum = registry.register::<ScrollBar, f64>("Maximum", PropertyMetadata::new(100.0));
        let value = registry.register::<ScrollBar, f64>(
            "Value",
            PropertyMetadataBuilder::new(0.0)
                .coerce(move |bar, v: f64| {
                    let min = bar.get(minimum).unwrap_or(0.0);
                    let max = bar.get(maximum).unwrap_or(min);
                    clamp_between(v, min, max)
                })
                .build(),
        );
        let viewport_size = registry.register::<ScrollBar, f64>(
            "ViewportSize",
            PropertyMetadataBuilder::new(0.0)
                .coerce(|_, v: f64| finite_or_zero(v))
                .build(),
        );
        registry.affects_coercion(minimum, value);
        registry.affects_coercion(maximum, value);
        registry.affects_render(minimum);
        registry.affects_render(maximum);
        registry.affects_render(value);
        registry.affects_render(viewport_size);

        let presenter_extent = registry
            .register::<ScrollContentPresenter, Size>("Extent", PropertyMetadata::new(Size::ZERO));
        let presenter_viewport = registry
            .register::<ScrollContentPresenter, Size>("Viewport", PropertyMetadata::new(Size::ZERO));
        let presenter_offset = registry.register::<ScrollContentPresenter, Vec2>(
            "Offset",
            PropertyMetadataBuilder::new(Vec2::ZERO)
                .affects(Affects::ARRANGE)
                .build(),
        );

        let extent =
            registry.register::<ScrollViewer, Size>("Extent", PropertyMetadata::new(Size::ZERO));
        let viewport =
            registry.register::<ScrollViewer, Size>("Viewport", PropertyMetadata::new(Size::ZERO));
        let offset = registry.register::<ScrollViewer, Vec2>(
            "Offset",
            PropertyMetadataBuilder::new(Vec2::ZERO)
                .coerce(move |viewer, v: Vec2| {
                    let extent = viewer.get(extent).unwrap_or(Size::ZERO);
                    let viewport = viewer.get(viewport).unwrap_or(Size::ZERO);
                    clamp_offset(v, extent, viewport)
                })
                .build(),
        );
        registry.affects_coercion(extent, offset);
        registry.affects_coercion(viewport, offset);

        tracing::debug!(properties = registry.len(), "registered control properties");

        Self {
            registry: Rc::new(registry),
            is_visible,
            width,
            height,
            minimum,
            maximum,
            value,
            viewport_size,
            presenter_extent,
            presenter_viewport,
            presenter_offset,
            extent,
            viewport,
            offset,
        }
    }

    /// Returns the registry the handles belong to.
    #[must_use]
    pub fn registry(&self) -> &Rc<PropertyRegistry> {
        &self.registry
    }
}

thread_local! {
    static PROPERTIES: Rc<ControlProperties> = Rc::new(ControlProperties::register());
}

/// Returns this thread's control property handles.
#[must_use]
pub fn control_properties() -> Rc<ControlProperties> {
    PROPERTIES.with(Rc::clone)
}
