//! Required-field checks over composed objects
//!
//! Only the object's own top-level fields are inspected. Field names compare
//! case-insensitively.

use crate::types::Node;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    FieldMissing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub code: ErrorCode,
    pub message: String,
    pub field: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Declares the fields a composed object must carry
#[derive(Debug, Clone, Default)]
pub struct Validator {
    required: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a field; repeated declarations are ignored
    pub fn required(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.required.iter().any(|r| r.eq_ignore_ascii_case(&name)) {
            self.required.push(name);
        }
        self
    }

    /// Report every required field `node` lacks, in declaration order
    pub fn validate(&self, node: &Node) -> ValidationResult {
        let errors = self
            .required
            .iter()
            .filter(|name| !node.keys().any(|key| key.eq_ignore_ascii_case(name)))
            .map(|name| ValidationError {
                code: ErrorCode::FieldMissing,
                message: format!("The field '{}' is required.", name),
                field: name.clone(),
            })
            .collect();

        ValidationResult { errors }
    }
}
