// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use understory_property::PropertyError;

/// A template did not provide the parts a control needs.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// No part with this name was supplied.
    #[error("template part `{name}` is missing")]
    MissingPart {
        /// Part name looked up.
        name: &'static str,
    },
    /// A part with this name exists but has another type.
    #[error("template part `{name}` is not a `{expected}`")]
    WrongPartType {
        /// Part name looked up.
        name: &'static str,
        /// Type name the control asked for.
        expected: &'static str,
    },
}

/// Layout did not reach a stable state.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// Every allowed pass still left invalidated controls behind.
    #[error("layout did not settle within {passes} passes")]
    PassLimitExceeded {
        /// Passes that were run.
        passes: usize,
    },
}

/// Any error raised by this crate.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// See [`PropertyError`].
    #[error(transparent)]
    Property(#[from] PropertyError),
    /// See [`ConfigurationError`].
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// See [`LayoutError`].
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_part() {
        let missing = ConfigurationError::MissingPart { name: "presenter" };
        assert_eq!(missing.to_string(), "template part `presenter` is missing");
        let wrong = Error::from(ConfigurationError::WrongPartType {
            name: "verticalScrollBar",
            expected: "ScrollBar",
        });
        assert_eq!(
            wrong.to_string(),
            "template part `verticalScrollBar` is not a `ScrollBar`"
        );
    }
}
