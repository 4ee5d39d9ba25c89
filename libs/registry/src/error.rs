//! Registry client errors.

use std::io;

use bndl_store::PullError;
use thiserror::Error;

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedDigest(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required: {0}")]
    AuthRequired(String),

    #[error("Document too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("Unexpected registry response {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("TLS configuration error: {0}")]
    Tls(String),
}

impl From<RegistryError> for PullError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(what) => PullError::NotFound(what),
            RegistryError::AuthRequired(what) => PullError::Unauthorized(what),
            RegistryError::DigestMismatch { .. }
            | RegistryError::UnsupportedDigest(_)
            | RegistryError::InvalidManifest(_)
            | RegistryError::Json(_)
            | RegistryError::TooLarge { .. } => PullError::InvalidBundle(err.to_string()),
            other => PullError::transport(other),
        }
    }
}
