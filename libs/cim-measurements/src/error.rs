//! Measurement Engine Error Types

use cim_model::ModelError;
use errors::{CimError, CimErrorTrait, ErrorCategory};
use thiserror::Error;

/// Result type for measurement engine operations
pub type Result<T> = std::result::Result<T, MeasurementError>;

/// Measurement engine errors
#[derive(Debug, Error)]
pub enum MeasurementError {
    /// Malformed constructor or configuration input
    #[error("Invalid argument: {argument}: {reason}")]
    InvalidArgument { argument: String, reason: String },

    /// Equipment variant without a synthesis strategy
    #[error("No synthesis strategy for {class} '{name}'")]
    UnhandledEquipmentVariant { class: String, name: String },

    /// Persisted identity map cannot be trusted
    #[error("Identity file corrupt: {path}: {reason}")]
    IdentityFileCorrupt { path: String, reason: String },

    /// Every reseed attempt collided
    #[error("Identifier space exhausted for seed {seed}")]
    IdentifierSpaceExhausted { seed: String },

    /// Synthesis failed for one equipment instance
    #[error("Synthesis failed for {class} '{name}': {reason}")]
    Synthesis {
        class: String,
        name: String,
        reason: String,
    },

    /// Graph model error
    #[error(transparent)]
    Model(#[from] ModelError),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for MeasurementError {
    fn from(err: std::io::Error) -> Self {
        MeasurementError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MeasurementError {
    fn from(err: serde_json::Error) -> Self {
        MeasurementError::Serialization(err.to_string())
    }
}

// Helper methods
impl MeasurementError {
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        MeasurementError::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    pub fn synthesis(
        class: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        MeasurementError::Synthesis {
            class: class.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn corrupt(path: impl Into<String>, reason: impl Into<String>) -> Self {
        MeasurementError::IdentityFileCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl CimErrorTrait for MeasurementError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::UnhandledEquipmentVariant { .. } => "UNHANDLED_EQUIPMENT_VARIANT",
            Self::IdentityFileCorrupt { .. } => "IDENTITY_FILE_CORRUPT",
            Self::IdentifierSpaceExhausted { .. } => "IDENTIFIER_SPACE_EXHAUSTED",
            Self::Synthesis { .. } => "SYNTHESIS_ERROR",
            Self::Model(err) => err.error_code(),
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument { .. } => ErrorCategory::Validation,
            Self::UnhandledEquipmentVariant { .. } | Self::Synthesis { .. } => {
                ErrorCategory::Synthesis
            },
            Self::IdentityFileCorrupt { .. } => ErrorCategory::DataCorruption,
            Self::IdentifierSpaceExhausted { .. } => ErrorCategory::ResourceExhausted,
            Self::Model(err) => err.category(),
            Self::Io(_) | Self::Serialization(_) => ErrorCategory::Io,
        }
    }
}

impl From<MeasurementError> for CimError {
    fn from(err: MeasurementError) -> Self {
        match err {
            MeasurementError::InvalidArgument { argument, reason } => {
                CimError::InvalidArgument { argument, reason }
            },
            MeasurementError::IdentityFileCorrupt { path, reason } => {
                CimError::IdentityFileCorrupt { path, reason }
            },
            MeasurementError::IdentifierSpaceExhausted { seed } => {
                CimError::IdentifierSpaceExhausted { seed }
            },
            MeasurementError::Model(err) => err.into(),
            MeasurementError::Io(msg) => CimError::Io(std::io::Error::other(msg)),
            MeasurementError::Serialization(msg) => CimError::Serialization(msg),
            other => CimError::Synthesis(other.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_errors_are_not_fatal() {
        let err = MeasurementError::synthesis("PowerTransformer", "reg1", "bad phases");
        assert!(!err.is_fatal());
        assert_eq!(err.error_code(), "SYNTHESIS_ERROR");

        let err = MeasurementError::UnhandledEquipmentVariant {
            class: "Cut".into(),
            name: "cut1".into(),
        };
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_identity_errors_are_fatal() {
        let err = MeasurementError::corrupt("ids.json", "not a uuid");
        assert!(err.is_fatal());
        assert_eq!(err.exit_code(), 4);

        let cim: CimError = err.into();
        assert_eq!(cim.error_code(), "IDENTITY_FILE_CORRUPT");
    }

    #[test]
    fn test_model_errors_pass_through() {
        let err: MeasurementError = ModelError::reference("terminal", "T9").into();
        assert_eq!(err.error_code(), "UNRESOLVED_REFERENCE");
        assert!(err.is_fatal());
    }
}
