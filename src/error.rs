//! Error handling for synthetic container generation

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, ModelSynthError>;

/// Main error type for modelsynth operations
#[derive(Error, Debug)]
pub enum ModelSynthError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The container could not be written to its destination
    #[error("Failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ModelSynthError {
    /// Create an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Create a write failure for `path`
    pub fn write_failure(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::WriteFailure {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether this error came from writing the output container
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::WriteFailure { .. })
    }
}

impl From<serde_json::Error> for ModelSynthError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Reasons an external metadata record could not be used.
///
/// These never escape [`MetadataResolver`](crate::metadata::MetadataResolver);
/// they are carried in [`Resolution::Defaulted`](crate::metadata::Resolution)
/// so callers can see why the defaults were substituted.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The record could not be opened or read
    #[error("metadata record {} unavailable: {source}", path.display())]
    Missing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The record was read but is not valid JSON for its schema
    #[error("metadata record {} is malformed: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A required key is absent or empty
    #[error("metadata record {} has no usable '{field}'", path.display())]
    MissingField { path: PathBuf, field: &'static str },

    /// A key is present but its value cannot be used
    #[error("metadata record {} has invalid '{field}': {reason}", path.display())]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_failure_display() {
        let err = ModelSynthError::write_failure(
            "/nope/model.tflite",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_write_failure());
        assert_eq!(err.to_string(), "Failed to write /nope/model.tflite: denied");
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: ModelSynthError = parse.unwrap_err().into();
        assert!(matches!(err, ModelSynthError::Serialization(_)));
        assert!(!err.is_write_failure());
    }

    #[test]
    fn test_missing_field_display() {
        let err = MetadataError::MissingField {
            path: PathBuf::from("stats.json"),
            field: "mean",
        };
        assert_eq!(err.to_string(), "metadata record stats.json has no usable 'mean'");
    }
}
