//! # bndl-testing
//!
//! Test doubles and fixtures shared by the workspace's integration tests.
//!
//! [`FakePuller`] stands in for a registry: it serves scripted documents,
//! records every reference it is asked for, and can be told to fail.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bndl_reference::Reference;
use bndl_store::{BundleDocument, PullError, RemotePuller};

/// In-memory [`RemotePuller`] for tests.
#[derive(Debug, Default)]
pub struct FakePuller {
    documents: Mutex<HashMap<Reference, BundleDocument>>,
    calls: Mutex<Vec<Reference>>,
    fail_pulls: bool,
}

impl FakePuller {
    /// Create a puller with no documents; every pull is a registry miss.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a puller that fails every pull with a transport error.
    pub fn failing() -> Self {
        Self {
            fail_pulls: true,
            ..Self::default()
        }
    }

    /// Serve `document` for `reference`.
    pub fn with_document(self, reference: Reference, document: BundleDocument) -> Self {
        self.insert(reference, document);
        self
    }

    /// Serve `document` for `reference`, replacing any previous one.
    pub fn insert(&self, reference: Reference, document: BundleDocument) {
        self.documents
            .lock()
            .expect("fake puller documents lock poisoned")
            .insert(reference, document);
    }

    /// References pulled so far, in call order.
    pub fn calls(&self) -> Vec<Reference> {
        self.calls
            .lock()
            .expect("fake puller calls lock poisoned")
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .expect("fake puller calls lock poisoned")
            .len()
    }
}

#[async_trait]
impl RemotePuller for FakePuller {
    async fn pull(&self, reference: &Reference) -> Result<BundleDocument, PullError> {
        self.calls
            .lock()
            .expect("fake puller calls lock poisoned")
            .push(reference.clone());

        if self.fail_pulls {
            return Err(PullError::transport("simulated registry outage"));
        }

        self.documents
            .lock()
            .expect("fake puller documents lock poisoned")
            .get(reference)
            .cloned()
            .ok_or_else(|| PullError::NotFound(reference.to_string()))
    }
}

/// Parse a reference, panicking on invalid input.
pub fn reference(s: &str) -> Reference {
    Reference::parse(s).unwrap_or_else(|e| panic!("invalid test reference {s:?}: {e}"))
}

/// Build a CNAB-shaped bundle document.
pub fn bundle(name: &str, version: &str) -> BundleDocument {
    serde_json::from_value(serde_json::json!({
        "schemaVersion": "v1.0.0",
        "name": name,
        "version": version,
        "invocationImages": [
            { "imageType": "docker", "image": format!("{name}-invoc:{version}") }
        ],
        "images": {}
    }))
    .unwrap_or_else(|e| panic!("invalid test bundle: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_scripted_documents() {
        let r = reference("a/b:1.0");
        let puller = FakePuller::new().with_document(r.clone(), bundle("b", "1.0"));

        let doc = puller.pull(&r).await.unwrap();
        assert_eq!(doc.name(), Some("b"));
        assert_eq!(puller.calls(), vec![r]);
    }

    #[tokio::test]
    async fn test_unknown_reference_is_not_found() {
        let puller = FakePuller::new();
        let err = puller.pull(&reference("a/b:1.0")).await.unwrap_err();
        assert!(matches!(err, PullError::NotFound(_)));
        assert_eq!(puller.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_puller() {
        let puller = FakePuller::failing();
        let err = puller.pull(&reference("a/b:1.0")).await.unwrap_err();
        assert!(matches!(err, PullError::Transport(_)));
    }
}
