//! Validation for catalog entity payloads.
//!
//! Create and update bodies carry a single `name` field. It must be present,
//! non-blank and at most [`MAX_NAME_LENGTH`] characters long.

use std::fmt;

/// Maximum number of characters in an entity name.
pub const MAX_NAME_LENGTH: usize = 30;

/// Validation error types
#[derive(Debug, PartialEq, Eq)]
pub enum ValidationError {
    MissingField {
        field: &'static str,
    },
    EmptyField {
        field: &'static str,
    },
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField { field } => {
                write!(f, "Field '{}' is required", field)
            }
            ValidationError::EmptyField { field } => {
                write!(f, "Field '{}' is required but was empty", field)
            }
            ValidationError::TooLong { field, max, actual } => {
                write!(
                    f,
                    "Field '{}' must be at most {} characters, got {}",
                    field, max, actual
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate an optional entity name, returning the accepted value.
pub fn validate_name(name: Option<&str>) -> ValidationResult<String> {
    let name = name.ok_or(ValidationError::MissingField { field: "name" })?;
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "name" });
    }
    let length = name.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name",
            max: MAX_NAME_LENGTH,
            actual: length,
        });
    }
    Ok(name.to_string())
}
