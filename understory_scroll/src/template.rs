// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named template parts.
//!
//! A template system instantiates a control's visual parts and hands them
//! over as a [`TemplateParts`] map. Controls resolve each part once, by name
//! and type, when the template is applied.

use std::any::{Any, type_name};
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::error::ConfigurationError;

/// Name of the [`ScrollContentPresenter`](crate::ScrollContentPresenter) part.
pub const PRESENTER_PART: &str = "presenter";
/// Name of the horizontal [`ScrollBar`](crate::ScrollBar) part.
pub const HORIZONTAL_SCROLL_BAR_PART: &str = "horizontalScrollBar";
/// Name of the vertical [`ScrollBar`](crate::ScrollBar) part.
pub const VERTICAL_SCROLL_BAR_PART: &str = "verticalScrollBar";

/// Instantiated template children, keyed by name.
#[derive(Clone, Default)]
pub struct TemplateParts {
    parts: HashMap<String, Rc<dyn Any>>,
}

impl fmt::Debug for TemplateParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.parts.keys()).finish()
    }
}

impl TemplateParts {
    /// Creates an empty set of parts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the part called `name`.
    pub fn insert<T: Any>(&mut self, name: impl Into<String>, part: Rc<T>) {
        self.parts.insert(name.into(), part);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with<T: Any>(mut self, name: impl Into<String>, part: Rc<T>) -> Self {
        self.insert(name, part);
        self
    }

    /// Removes the part called `name`.
    pub fn remove(&mut self, name: &str) -> Option<Rc<dyn Any>> {
        self.parts.remove(name)
    }

    /// Returns `true` if a part called `name` exists, whatever its type.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    /// Returns the number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns `true` if there are no parts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Looks up a part by name and type.
    #[must_use]
    pub fn get<T: Any>(&self, name: &str) -> Option<Rc<T>> {
        self.parts.get(name)?.clone().downcast::<T>().ok()
    }

    /// Like [`get`](Self::get), but says why the part is unusable.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::MissingPart`] or
    /// [`ConfigurationError::WrongPartType`].
    pub fn require<T: Any>(&self, name: &'static str) -> Result<Rc<T>, ConfigurationError> {
        let part = self
            .parts
            .get(name)
            .ok_or(ConfigurationError::MissingPart { name })?;
        part.clone()
            .downcast::<T>()
            .map_err(|_| ConfigurationError::WrongPartType {
                name,
                expected: short_type_name::<T>(),
            })
    }
}

fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Thumb;

    #[test]
    fn typed_lookup() {
        let parts = TemplateParts::new().with("thumb", Rc::new(Thumb));
        assert!(parts.get::<Thumb>("thumb").is_some());
        assert!(parts.get::<u8>("thumb").is_none());
        assert!(parts.get::<Thumb>("track").is_none());
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn require_explains_failures() {
        let parts = TemplateParts::new().with("thumb", Rc::new(7_u32));
        assert_eq!(
            parts.require::<Thumb>("track").err(),
            Some(ConfigurationError::MissingPart { name: "track" })
        );
        assert_eq!(
            parts.require::<Thumb>("thumb").err(),
            Some(ConfigurationError::WrongPartType {
                name: "thumb",
                expected: "Thumb",
            })
        );
        assert_eq!(parts.require::<u32>("thumb").as_deref(), Ok(&7));
    }
}
