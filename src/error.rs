//! Error types for row composition and query building
//!
//! Column names never fail to classify: any name that does not match the
//! identity, group, list or array patterns is kept as a plain scalar.

use crate::types::FieldKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecastError {
    /// Two columns of one row resolve to the same field of the same object.
    #[error("Duplicate field name '{name}' in row")]
    DuplicateFieldName { name: String },
    /// A field already bound to one kind is targeted as another kind.
    #[error("Field '{name}' is already a {existing}, cannot use it as a {incoming}")]
    TypeMismatch {
        name: String,
        existing: FieldKind,
        incoming: FieldKind,
    },
    /// Nested groups go deeper than `MapConfig::max_depth`.
    #[error("Nesting depth {depth} exceeds the configured maximum")]
    DepthExceeded { depth: usize },
    /// The query references a parameter that was not supplied.
    #[error("Missing query parameter '{name}'")]
    MissingParameter { name: String },
    /// A name parameter would break out of its `[...]` quoting.
    #[error("Name parameter '{name}' must not contain square brackets: {value}")]
    InvalidNameParameter { name: String, value: String },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RecastError>;
