//! Error types for policy ingestion

use std::path::PathBuf;

/// Errors while loading policy documents
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Document is not valid JSON or does not match the schema
    #[error("invalid policy document: {message}")]
    InvalidDocument { message: String },

    /// Document names no file
    #[error("policy document has an empty fileName")]
    EmptyFileName,

    /// IO error during document read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PolicyError {
    /// Create invalid-document error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for policy operations
pub type PolicyResult<T> = Result<T, PolicyError>;
