// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised by property reads and writes.

use alloc::borrow::Cow;
use alloc::format;

use crate::id::PropertyId;

/// Failure reading or writing a property.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    /// The property is unknown, has a different value type, or is not
    /// registered for the object's owner type.
    #[error("property `{name}` ({id}) is not valid on `{owner}`")]
    InvalidProperty {
        /// The offending id.
        id: PropertyId,
        /// Registered name, or `"<unregistered>"`.
        name: &'static str,
        /// Type name of the object that was accessed.
        owner: &'static str,
    },
    /// A coercion callback tried to write a property.
    #[error("cannot write `{name}` while a coercion callback is running")]
    WriteDuringCoercion {
        /// Name of the property the callback tried to write.
        name: &'static str,
    },
    /// A coercion callback rejected the proposed value. The store is unchanged.
    #[error("coercing `{name}` failed")]
    Coercion {
        /// Name of the property being coerced.
        name: &'static str,
        /// What the callback reported.
        #[source]
        source: CoerceError,
    },
}

/// Error returned by a coercion callback.
///
/// ```rust
/// use understory_property::CoerceError;
///
/// let err = CoerceError::new("range is inverted");
/// assert_eq!(err.to_string(), "range is inverted");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CoerceError {
    message: Cow<'static, str>,
}

impl CoerceError {
    /// Creates an error with the given message.
    #[must_use]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<PropertyError> for CoerceError {
    fn from(err: PropertyError) -> Self {
        Self::new(format!("{err}"))
    }
}
