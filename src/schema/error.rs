//! Errors raised by the field edit primitives

use thiserror::Error;

/// Failure of a single schema edit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A field with this id already exists in the collection
    #[error("field id '{0}' already exists in the collection")]
    DuplicateFieldId(String),

    /// Another field already uses this name
    #[error("field name '{0}' is already used by another field")]
    DuplicateFieldName(String),

    /// No field with this id exists in the collection
    #[error("field '{0}' not found in the collection")]
    FieldNotFound(String),
}
