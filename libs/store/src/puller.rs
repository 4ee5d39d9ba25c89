//! Remote pull capability.

use std::sync::Arc;

use async_trait::async_trait;
use bndl_reference::Reference;

use crate::document::BundleDocument;
use crate::error::PullError;

/// Fetches a bundle document from a remote registry.
///
/// The reference passed in always carries a tag or a digest. Connections,
/// authentication and retries belong to the implementation.
#[async_trait]
pub trait RemotePuller: Send + Sync {
    /// Pull the bundle document for a reference.
    async fn pull(&self, reference: &Reference) -> Result<BundleDocument, PullError>;
}

#[async_trait]
impl<T: RemotePuller + ?Sized> RemotePuller for Arc<T> {
    async fn pull(&self, reference: &Reference) -> Result<BundleDocument, PullError> {
        (**self).pull(reference).await
    }
}
