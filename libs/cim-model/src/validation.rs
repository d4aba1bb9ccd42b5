//! Validation Utilities
//!
//! Pure validation logic for model keys, object names and identifiers.
//! No IO dependencies.

use crate::error::{ModelError, Result};
use uuid::Uuid;

/// Maximum length of an equipment or measurement name
pub const MAX_NAME_LENGTH: usize = 256;

/// Validate a model key (the model mRID)
///
/// Rules:
/// - Not empty
/// - No whitespace or control characters
///
/// # Examples
/// ```
/// use cim_model::validate_model_key;
///
/// assert!(validate_model_key("_4F76A5F9-271D-9EB8-5E31-AA362D86F2C3").is_ok());
/// assert!(validate_model_key("").is_err());
/// assert!(validate_model_key("two words").is_err());
/// ```
pub fn validate_model_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(ModelError::invalid_argument(
            "model key",
            "Model key cannot be empty",
        ));
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ModelError::invalid_argument(
            "model key",
            format!("Model key cannot contain whitespace: '{}'", key),
        ));
    }
    Ok(())
}

/// Validate an equipment or measurement name
///
/// Rules:
/// - Length: 1-256 characters
/// - No control characters
///
/// # Examples
/// ```
/// use cim_model::validate_object_name;
///
/// assert!(validate_object_name("ACLineSegment", "line_670671").is_ok());
/// assert!(validate_object_name("EnergyConsumer", "").is_err());
/// ```
pub fn validate_object_name(class_name: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ModelError::validation(format!(
            "{} name cannot be empty",
            class_name
        )));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ModelError::validation(format!(
            "{} name too long ({} characters). Maximum length is {} characters.",
            class_name,
            name.chars().count(),
            MAX_NAME_LENGTH
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(ModelError::validation(format!(
            "{} name contains control characters: {:?}",
            class_name, name
        )));
    }
    Ok(())
}

/// Parse a measurement identifier
///
/// Accepts any case and an optional leading underscore (the CIM XML
/// convention); the result is the canonical UUID.
///
/// # Examples
/// ```
/// use cim_model::parse_measurement_id;
///
/// let id = parse_measurement_id("_0DDA4A1B-3E5C-4D0A-9F1E-2C0A5B6E7F80").unwrap();
/// assert_eq!(id.to_string(), "0dda4a1b-3e5c-4d0a-9f1e-2c0a5b6e7f80");
/// assert!(parse_measurement_id("not-a-uuid").is_err());
/// ```
pub fn parse_measurement_id(raw: &str) -> Result<Uuid> {
    let trimmed = raw.strip_prefix('_').unwrap_or(raw);
    Uuid::parse_str(trimmed).map_err(|e| {
        ModelError::invalid_argument(
            "measurement identifier",
            format!("'{}' is not a UUID: {}", raw, e),
        )
    })
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_validate_model_key() {
        assert!(validate_model_key("F1").is_ok());
        assert!(validate_model_key("").is_err());
        assert!(validate_model_key("a\tb").is_err());
    }

    #[test]
    fn test_validate_object_name() {
        assert!(validate_object_name("Breaker", "brk_650").is_ok());
        assert!(validate_object_name("Breaker", "line\nbreak").is_err());

        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        let err = validate_object_name("Breaker", &long).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn test_parse_measurement_id() {
        let lower = parse_measurement_id("0dda4a1b-3e5c-4d0a-9f1e-2c0a5b6e7f80").unwrap();
        let upper = parse_measurement_id("_0DDA4A1B-3E5C-4D0A-9F1E-2C0A5B6E7F80").unwrap();
        assert_eq!(lower, upper);
        assert!(parse_measurement_id("_").is_err());
        assert!(parse_measurement_id("").is_err());
    }
}
