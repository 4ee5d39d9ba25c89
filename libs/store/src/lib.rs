//! # bndl-store
//!
//! Local on-disk cache ("bundle store") for application bundle documents.
//!
//! Given a reference, the store returns the bundle document, pulling it
//! through a [`RemotePuller`] and persisting it on a cache miss:
//!
//! ```text
//! lookup_or_pull(ref) ──> read(ref) ──hit──> document
//!                            │
//!                          miss / force
//!                            ▼
//!                      puller.pull(ref) ──> store(ref, document) ──> document
//! ```
//!
//! ## Layout
//!
//! ```text
//! <root>/<name>/_tags/<tag>.json
//! <root>/<name>/_digests/<algorithm>/<encoded>.json
//! ```
//!
//! See [`bndl_reference::codec`] for how names map onto directories.

mod document;
mod error;
mod puller;
mod store;

pub use document::{BundleDocument, BundleImage};
pub use error::{PullError, StoreError};
pub use puller::RemotePuller;
pub use store::BundleStore;

pub use bndl_reference::{Digest, Reference, ReferenceError, Repository};
