//! Model Layer Error Types

use errors::{CimError, CimErrorTrait, ErrorCategory};
use thiserror::Error;
use uuid::Uuid;

/// Result type for cim-model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Model layer errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Malformed token or constructor input
    #[error("Invalid argument: {argument}: {reason}")]
    InvalidArgument { argument: String, reason: String },

    /// Document references an object that does not exist
    #[error("Unresolved {kind} reference: {mrid}")]
    Reference { kind: &'static str, mrid: String },

    /// Same mRID appears twice in one collection
    #[error("Duplicate mRID in {collection}: {mrid}")]
    DuplicateMrid {
        collection: &'static str,
        mrid: String,
    },

    /// Measurement identifier already present in the arena
    #[error("Measurement identifier already in use: {0}")]
    IdentifierInUse(Uuid),

    /// Arena handles disagree with each other
    #[error("Inconsistent graph: {0}")]
    Inconsistent(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Document parsing error
    #[error("Parse error: {file}: {error}")]
    Parse { file: String, error: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        ModelError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ModelError {
    fn from(err: serde_yaml::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

// Helper methods
impl ModelError {
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    pub fn reference(kind: &'static str, mrid: impl Into<String>) -> Self {
        ModelError::Reference {
            kind,
            mrid: mrid.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ModelError::Validation(msg.into())
    }

    pub fn inconsistent(msg: impl Into<String>) -> Self {
        ModelError::Inconsistent(msg.into())
    }
}

impl CimErrorTrait for ModelError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::Reference { .. } => "UNRESOLVED_REFERENCE",
            Self::DuplicateMrid { .. } => "DUPLICATE_MRID",
            Self::IdentifierInUse(_) => "IDENTIFIER_IN_USE",
            Self::Inconsistent(_) => "INCONSISTENT_GRAPH",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument { .. } | Self::Validation(_) => ErrorCategory::Validation,
            Self::Reference { .. }
            | Self::DuplicateMrid { .. }
            | Self::IdentifierInUse(_)
            | Self::Inconsistent(_) => ErrorCategory::Model,
            Self::Io(_) | Self::Parse { .. } | Self::Serialization(_) => ErrorCategory::Io,
        }
    }
}

impl From<ModelError> for CimError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidArgument { argument, reason } => {
                CimError::InvalidArgument { argument, reason }
            },
            ModelError::Io(msg) => CimError::Io(std::io::Error::other(msg)),
            ModelError::Parse { file, error } => CimError::ParseError { file, error },
            ModelError::Serialization(msg) => CimError::Serialization(msg),
            other => CimError::Model(other.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_model_error_classification() {
        let err = ModelError::reference("connectivity node", "N42");
        assert_eq!(err.error_code(), "UNRESOLVED_REFERENCE");
        assert_eq!(err.category(), ErrorCategory::Model);
        assert!(err.is_fatal());

        let err = ModelError::invalid_argument("profile", "rc3");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_conversion_into_cim_error() {
        let err: CimError = ModelError::invalid_argument("database", "Oracle").into();
        assert!(matches!(err, CimError::InvalidArgument { ref argument, .. } if argument == "database"));

        let err: CimError = ModelError::inconsistent("terminal 3 not owned by equipment 1").into();
        assert_eq!(err.error_code(), "MODEL_ERROR");
    }
}
