//! Unified error handling for the CIM measurement tooling
//!
//! Every library crate keeps its own domain error enum and implements
//! [`CimErrorTrait`] so the CLI can classify failures (fatal or not, exit
//! code, log level) without knowing the concrete type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// ============================================================================
// ErrorInfo - report error type
// ============================================================================

/// Serializable error summary used in run reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error code (e.g. `SYNTHESIS_ERROR`)
    pub code: String,
    /// Error message
    pub message: String,
    /// Detailed error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Field-specific context (equipment class, name, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

impl ErrorInfo {
    /// Create a new ErrorInfo with just a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: "UNKNOWN_ERROR".to_string(),
            message: message.into(),
            details: None,
            context: BTreeMap::new(),
        }
    }

    /// Build from any error implementing the shared trait
    pub fn from_error<E: CimErrorTrait>(err: &E) -> Self {
        Self::new(err.to_string()).with_code(err.error_code())
    }

    /// Set the error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Add details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Add a context entry
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// CimError - Main error type
// ============================================================================

/// Main error type shared by the CLI and the support crates
#[derive(Debug, Error)]
pub enum CimError {
    // ======================================
    // Configuration Errors
    // ======================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    // ======================================
    // Argument Errors
    // ======================================
    #[error("Invalid argument: {argument}: {reason}")]
    InvalidArgument { argument: String, reason: String },

    // ======================================
    // Identity Errors
    // ======================================
    #[error("Identity file corrupt: {path}: {reason}")]
    IdentityFileCorrupt { path: String, reason: String },

    #[error("Identifier space exhausted for seed {seed}")]
    IdentifierSpaceExhausted { seed: String },

    // ======================================
    // Model & Synthesis Errors
    // ======================================
    #[error("Model error: {0}")]
    Model(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    // ======================================
    // File & I/O Errors
    // ======================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Parse error: {file}: {error}")]
    ParseError { file: String, error: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ======================================
    // Runtime Errors
    // ======================================
    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using CimError
pub type CimResult<T> = Result<T, CimError>;

impl CimError {
    /// Shorthand for an invalid argument error
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    /// Convert to ErrorInfo for reports
    pub fn to_error_info(&self) -> ErrorInfo {
        let mut info = ErrorInfo::from_error(self);
        match self {
            Self::InvalidArgument { argument, reason } => {
                info = info.with_context(argument.clone(), reason.clone());
            },
            Self::InvalidConfig { field, reason } => {
                info = info.with_context(field.clone(), reason.clone());
            },
            Self::IdentityFileCorrupt { path, .. } => {
                info = info.with_details(format!("Identity file: {}", path));
            },
            _ => {},
        }
        info
    }
}

// Conversion traits for common error types
impl From<serde_json::Error> for CimError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for CimError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Deserialization(err.to_string())
    }
}

// Helper macros for creating errors
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::CimError::Configuration($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::CimError::Configuration(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! invalid_argument {
    ($argument:expr, $msg:expr) => {
        $crate::CimError::invalid_argument($argument, $msg.to_string())
    };
    ($argument:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::CimError::invalid_argument($argument, format!($fmt, $($arg)*))
    };
}

impl CimErrorTrait for CimError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::IdentityFileCorrupt { .. } => "IDENTITY_FILE_CORRUPT",
            Self::IdentifierSpaceExhausted { .. } => "IDENTIFIER_SPACE_EXHAUSTED",
            Self::Model(_) => "MODEL_ERROR",
            Self::Synthesis(_) => "SYNTHESIS_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::ParseError { .. } => "PARSE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Deserialization(_) => "DESERIALIZATION_ERROR",
            Self::Logging(_) => "LOGGING_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Other(_) => "OTHER_ERROR",
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) | Self::InvalidConfig { .. } | Self::Logging(_) => {
                ErrorCategory::Configuration
            },
            Self::InvalidArgument { .. } => ErrorCategory::Validation,
            Self::IdentityFileCorrupt { .. } => ErrorCategory::DataCorruption,
            Self::IdentifierSpaceExhausted { .. } => ErrorCategory::ResourceExhausted,
            Self::Model(_) => ErrorCategory::Model,
            Self::Synthesis(_) => ErrorCategory::Synthesis,
            Self::FileNotFound(_) => ErrorCategory::NotFound,
            Self::Io(_)
            | Self::ParseError { .. }
            | Self::Serialization(_)
            | Self::Deserialization(_) => ErrorCategory::Io,
            Self::Internal(_) => ErrorCategory::Internal,
            Self::Other(_) => ErrorCategory::Unknown,
        }
    }
}

// ============================================================================
// Error Trait - Architectural layer
// ============================================================================

/// Error category enum - used for classification and exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    // Input layer
    Configuration,
    Validation,
    NotFound,
    Io,

    // Engine layer
    Model,
    Synthesis,

    // System level
    Internal,
    ResourceExhausted,
    DataCorruption,

    // Others
    Unknown,
}

/// Shared error capability trait
///
/// Each crate keeps its own domain error type and gains the common
/// classification interface by implementing this trait.
pub trait CimErrorTrait: std::error::Error + Send + Sync + 'static {
    /// Get error code (for reports and logs)
    fn error_code(&self) -> &'static str;

    /// Get error category
    fn category(&self) -> ErrorCategory;

    /// Whether the error must abort the run
    ///
    /// Synthesis errors are scoped to a single equipment instance and are
    /// recorded instead of propagated.
    fn is_fatal(&self) -> bool {
        !matches!(self.category(), ErrorCategory::Synthesis)
    }

    /// Process exit code for the CLI
    fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Validation => 2,
            ErrorCategory::NotFound | ErrorCategory::Io => 3,
            ErrorCategory::DataCorruption => 4,
            ErrorCategory::Model | ErrorCategory::Synthesis => 5,
            ErrorCategory::ResourceExhausted => 6,
            ErrorCategory::Internal | ErrorCategory::Unknown => 1,
        }
    }

    /// Get log level
    fn log_level(&self) -> tracing::Level {
        use tracing::Level;
        match self.category() {
            ErrorCategory::Internal
            | ErrorCategory::DataCorruption
            | ErrorCategory::ResourceExhausted => Level::ERROR,
            ErrorCategory::Synthesis | ErrorCategory::Model => Level::WARN,
            ErrorCategory::Validation | ErrorCategory::NotFound => Level::INFO,
            _ => Level::WARN,
        }
    }
}

// Tests
#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CimError::invalid_argument("profile", "unknown").error_code(),
            "INVALID_ARGUMENT"
        );
        assert_eq!(
            CimError::Synthesis("bad phase".into()).error_code(),
            "SYNTHESIS_ERROR"
        );
    }

    #[test]
    fn test_fatality() {
        assert!(CimError::IdentityFileCorrupt {
            path: "ids.json".into(),
            reason: "truncated".into()
        }
        .is_fatal());
        assert!(!CimError::Synthesis("skip".into()).is_fatal());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(CimError::invalid_argument("x", "y").exit_code(), 2);
        assert_eq!(
            CimError::IdentityFileCorrupt {
                path: "p".into(),
                reason: "r".into()
            }
            .exit_code(),
            4
        );
        assert_eq!(CimError::Internal("boom".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_info() {
        let info = CimError::invalid_argument("database", "unsupported token").to_error_info();
        assert_eq!(info.code, "INVALID_ARGUMENT");
        assert_eq!(
            info.context.get("database").map(String::as_str),
            Some("unsupported token")
        );
    }

    #[test]
    fn test_macros() {
        let err = config_error!("missing {}", "class_order");
        assert!(matches!(err, CimError::Configuration(ref m) if m == "missing class_order"));

        let err = invalid_argument!("profile", "{} is not supported", "rc3");
        assert!(err.to_string().contains("rc3 is not supported"));
    }
}
