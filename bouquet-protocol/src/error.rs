//! Error types for the bouquet property protocol.

use thiserror::Error;

use crate::types::PropertyKind;

/// Errors raised while reading or writing bouquet properties.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// Property id is not part of the class.
    #[error("Unknown property: {0}")]
    Unknown(String),

    /// Property cannot be written through the edit path.
    #[error("Property is read-only: {0}")]
    ReadOnly(String),

    /// Supplied value has the wrong type for the property.
    #[error("Type mismatch for {id}: expected {expected}")]
    TypeMismatch { id: String, expected: PropertyKind },

    /// Textual value could not be parsed into the property type.
    #[error("Invalid value for {id}: {value:?}")]
    InvalidValue { id: String, value: String },
}
