//! Error types for bundle store operations.

use std::io;
use std::path::PathBuf;

use bndl_reference::{Reference, ReferenceError};
use thiserror::Error;

/// Errors from bundle store operations.
///
/// Every operation either fully succeeds or fails with one of these.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A reference string given to the store does not parse.
    #[error(transparent)]
    InvalidReference(ReferenceError),

    /// No local entry exists for the reference.
    #[error("bundle \"{reference}\" not found in the bundle store")]
    NotFound { reference: Reference },

    /// The entry exists but is not a valid bundle document.
    #[error("failed to read bundle \"{reference}\": invalid bundle document: {source}")]
    Parse {
        reference: Reference,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read bundle \"{reference}\": {source}")]
    Read {
        reference: Reference,
        #[source]
        source: io::Error,
    },

    /// Filesystem failure while writing an entry.
    #[error("failed to store bundle \"{reference}\": {source}")]
    Write {
        reference: Reference,
        #[source]
        source: io::Error,
    },

    /// A file under the store root does not match the store layout.
    #[error(transparent)]
    MalformedPath(ReferenceError),

    /// Directory traversal failed while listing.
    #[error("failed to walk bundle store at {path:?}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The remote pull failed. `reference` is the caller's text, before
    /// any default tag was applied.
    #[error("{reference}: {source}")]
    Pull {
        reference: String,
        #[source]
        source: PullError,
    },
}

impl StoreError {
    /// Returns true if the reference has no local entry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Errors reported by a [`RemotePuller`](crate::RemotePuller).
///
/// The store wraps these with the reference and surfaces them as-is; it
/// never retries.
#[derive(Debug, Error)]
pub enum PullError {
    #[error("bundle not found in registry: {0}")]
    NotFound(String),

    #[error("registry authentication failed: {0}")]
    Unauthorized(String),

    #[error("invalid bundle: {0}")]
    InvalidBundle(String),

    #[error("{0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PullError {
    /// Wrap a transport-level failure.
    pub fn transport(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Transport(err.into())
    }
}
