//! Domain-specific errors.

use thiserror::Error;

/// Failures talking to the server endpoints.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Failures reading or writing origin-scoped storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access storage file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode storage contents: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures preparing concatenation output on the server.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConcatError {
    #[error("No files selected for concatenation.")]
    NoFiles,
    #[error("File not found: {0}")]
    NotFound(String),
}
