//! # bndl-reference
//!
//! Registry-style references for application bundles, and the reversible
//! mapping from those references onto store-relative file paths.
//!
//! ## Reference Format
//!
//! A reference is a repository name plus exactly one of a tag or a digest:
//!
//! - `myrepo/myapp:0.1.0`
//! - `myrepo/myapp@sha256:deadbeef`
//! - `localhost:5000/myrepo/myapp:0.1.0`
//!
//! ## Path Encoding
//!
//! [`codec::encode`] and [`codec::decode`] are inverses:
//! `decode(root.join(encode(r)), root) == r` for every valid reference, and
//! distinct references never share a path.

pub mod codec;
mod digest;
mod error;
mod name;
mod reference;

pub use digest::{Digest, SHA256};
pub use error::ReferenceError;
pub use name::{Repository, NAME_TOTAL_LENGTH_MAX};
pub use reference::{Reference, DEFAULT_DOMAIN, DEFAULT_TAG};
