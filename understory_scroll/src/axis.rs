// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-axis scroll arithmetic.
//!
//! Everything here is pure and works on one dimension at a time, so the
//! horizontal and vertical scroll bars share the same rules.

use kurbo::{Size, Vec2};

/// Scroll axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Left to right, driven by widths and `x`.
    Horizontal,
    /// Top to bottom, driven by heights and `y`.
    Vertical,
}

impl Orientation {
    /// Returns the dimension of `size` along this axis.
    #[must_use]
    pub fn length(self, size: Size) -> f64 {
        match self {
            Self::Horizontal => size.width,
            Self::Vertical => size.height,
        }
    }

    /// Returns the component of `v` along this axis.
    #[must_use]
    pub fn component(self, v: Vec2) -> f64 {
        match self {
            Self::Horizontal => v.x,
            Self::Vertical => v.y,
        }
    }

    /// Returns `v` with its component along this axis replaced.
    #[must_use]
    pub fn with_component(self, v: Vec2, value: f64) -> Vec2 {
        match self {
            Self::Horizontal => Vec2::new(value, v.y),
            Self::Vertical => Vec2::new(v.x, value),
        }
    }
}

/// Returns `true` if content of length `extent` overflows `viewport`.
///
/// Equal lengths do not scroll.
#[must_use]
pub fn is_scrollable(extent: f64, viewport: f64) -> bool {
    extent > viewport
}

/// Scroll bar range along one axis: `extent − viewport`.
///
/// Negative when the viewport is larger than the content. Only a non-finite
/// difference is reported as `0.0`.
#[must_use]
pub fn scroll_range(extent: f64, viewport: f64) -> f64 {
    let range = extent - viewport;
    if range.is_finite() { range } else { 0.0 }
}

/// Largest valid offset along one axis, never negative.
#[must_use]
pub fn scroll_maximum(extent: f64, viewport: f64) -> f64 {
    finite_or_zero(extent - viewport)
}

/// Scroll bar viewport size: `(viewport / extent) × (extent − viewport)`.
///
/// A zero extent divides by zero; that and any other non-finite or negative
/// result is reported as `0.0`.
///
/// ```rust
/// use understory_scroll::thumb_size;
///
/// assert_eq!(thumb_size(500.0, 100.0), 80.0);
/// assert_eq!(thumb_size(0.0, 100.0), 0.0);
/// assert_eq!(thumb_size(0.0, 0.0), 0.0);
/// ```
#[must_use]
pub fn thumb_size(extent: f64, viewport: f64) -> f64 {
    finite_or_zero(viewport / extent * (extent - viewport))
}

/// Returns `value` if it is finite and not negative, `0.0` otherwise.
#[must_use]
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}

/// Clamps `value` into `[min, max]`.
///
/// Unlike [`f64::clamp`] this never panics: NaN maps to `min`, and an
/// inverted range collapses to `min`.
#[must_use]
pub fn clamp_between(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    let max = if max >= min { max } else { min };
    value.max(min).min(max)
}

/// Clamps each component of `offset` into `[0, scroll_maximum]` for its axis.
#[must_use]
pub fn clamp_offset(offset: Vec2, extent: Size, viewport: Size) -> Vec2 {
    Vec2::new(
        clamp_between(offset.x, 0.0, scroll_maximum(extent.width, viewport.width)),
        clamp_between(offset.y, 0.0, scroll_maximum(extent.height, viewport.height)),
    )
}
