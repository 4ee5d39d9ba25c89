//! Error types for reference parsing and path decoding.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur when parsing references or decoding store paths.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// The reference string is unparseable, or lacks a tag or digest
    /// where one is required.
    #[error("invalid reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },

    /// A path under the store root does not match the expected layout.
    #[error("invalid path {path:?} in the bundle store: {reason}")]
    MalformedPath { path: PathBuf, reason: String },
}

impl ReferenceError {
    pub(crate) fn invalid(reference: &str, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedPath {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error came from parsing a reference.
    pub fn is_invalid_reference(&self) -> bool {
        matches!(self, ReferenceError::InvalidReference { .. })
    }

    /// Returns true if this error came from decoding a store path.
    pub fn is_malformed_path(&self) -> bool {
        matches!(self, ReferenceError::MalformedPath { .. })
    }
}
