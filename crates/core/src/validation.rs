//! Field-level validation errors shared by request payloads.

use serde::Serialize;

/// A single invalid field.
///
/// The API returns these to clients as `{ "field": ..., "message": ... }`
/// so form inputs can be highlighted individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Name of the offending field, as it appears in the request body.
    pub field: &'static str,
    /// Human-readable description of the problem.
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for `field`.
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Trim `value` and require it to be non-empty and at most `max` characters.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming `field` when the trimmed value is empty
/// or too long.
pub fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("name", "  Mug ", 10), Ok("Mug".to_owned()));
        assert_eq!(
            required_text("name", "   ", 10),
            Err(ValidationError::new("name", "is required"))
        );
        assert!(required_text("name", "abcdefghijk", 10).is_err());
    }

    #[test]
    fn test_display() {
        let err = ValidationError::new("qty", "must be positive");
        assert_eq!(err.to_string(), "qty: must be positive");
    }
}
