//! Registry client that pulls bundle documents.
//!
//! A bundle is published as an OCI image manifest whose config blob is the
//! bundle document. Pulling resolves the manifest by tag or digest, then
//! fetches and verifies the config blob.
//!
//! Reference: https://github.com/opencontainers/distribution-spec

use async_trait::async_trait;
use bndl_reference::{Digest, Reference, SHA256};
use bndl_store::{BundleDocument, PullError, RemotePuller};
use bytes::Bytes;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use sha2::{Digest as _, Sha256};
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::endpoint::Endpoint;
use crate::error::RegistryError;
use crate::tls::load_host_certificates;

/// Manifest media types accepted when resolving a reference.
const MANIFEST_ACCEPT: &str =
    "application/vnd.oci.image.manifest.v1+json, application/vnd.docker.distribution.manifest.v2+json";

/// Pulls bundle documents from OCI registries.
#[derive(Debug, Clone)]
pub struct RegistryPuller {
    config: RegistryConfig,
}

impl RegistryPuller {
    /// Create a new registry puller.
    pub fn new(config: RegistryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Pull the bundle document a reference points at.
    pub async fn pull_document(&self, reference: &Reference) -> Result<BundleDocument, RegistryError> {
        let endpoint = Endpoint::resolve(reference, &self.config);
        let client = self.client_for(&endpoint)?;

        let manifest_ref = match reference {
            Reference::Tagged { tag, .. } => tag.clone(),
            Reference::Digested { digest, .. } => digest.to_string(),
        };

        debug!(
            reference = %reference,
            registry = %endpoint.base_url,
            repo = %endpoint.path,
            "Resolving bundle manifest"
        );

        let body = self
            .fetch(&client, &endpoint.manifest_url(&manifest_ref), MANIFEST_ACCEPT)
            .await?;

        if let Some(digest) = reference.digest() {
            verify_digest(digest, &body)?;
        }

        let manifest: Manifest = serde_json::from_slice(&body)?;
        let config = manifest.config;

        if config.size > self.config.max_document_size {
            return Err(RegistryError::TooLarge {
                size: config.size,
                limit: self.config.max_document_size,
            });
        }

        let config_digest = Digest::parse(&config.digest)
            .map_err(|e| RegistryError::InvalidManifest(e.to_string()))?;

        let blob = self
            .fetch(&client, &endpoint.blob_url(&config.digest), &config.media_type)
            .await?;
        verify_digest(&config_digest, &blob)?;

        let document = BundleDocument::from_slice(&blob)?;

        info!(
            reference = %reference,
            digest = %config_digest,
            size = blob.len(),
            "Bundle pulled"
        );

        Ok(document)
    }

    fn client_for(&self, endpoint: &Endpoint) -> Result<Client, RegistryError> {
        let mut builder = Client::builder().timeout(self.config.timeout);

        if !endpoint.insecure {
            if let Some(certs_dir) = &self.config.certs_dir {
                let certs = load_host_certificates(certs_dir, &endpoint.host)?;
                for cert in certs.root_certificates {
                    builder = builder.add_root_certificate(cert);
                }
                if let Some(identity) = certs.identity {
                    builder = builder.identity(identity);
                }
            }
        }

        Ok(builder.build()?)
    }

    async fn fetch(&self, client: &Client, url: &str, accept: &str) -> Result<Bytes, RegistryError> {
        debug!(url = %url, "Fetching from registry");

        let mut request = client.get(url).header(ACCEPT, accept);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let limit = self.config.max_document_size;

        match response.status() {
            StatusCode::OK => {
                if let Some(size) = response.content_length() {
                    if size > limit {
                        return Err(RegistryError::TooLarge { size, limit });
                    }
                }

                let body = response.bytes().await?;
                let size = body.len() as u64;
                if size > limit {
                    return Err(RegistryError::TooLarge { size, limit });
                }
                Ok(body)
            }
            StatusCode::NOT_FOUND => Err(RegistryError::NotFound(url.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(RegistryError::AuthRequired(url.to_string()))
            }
            status => Err(RegistryError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            }),
        }
    }
}

#[async_trait]
impl RemotePuller for RegistryPuller {
    async fn pull(&self, reference: &Reference) -> Result<BundleDocument, PullError> {
        Ok(self.pull_document(reference).await?)
    }
}

/// Check content against a digest. Only sha256 can be verified.
fn verify_digest(expected: &Digest, content: &[u8]) -> Result<(), RegistryError> {
    if expected.algorithm() != SHA256 {
        return Err(RegistryError::UnsupportedDigest(expected.algorithm().to_string()));
    }

    let computed = hex::encode(Sha256::digest(content));
    if computed != expected.encoded() {
        return Err(RegistryError::DigestMismatch {
            expected: expected.to_string(),
            actual: format!("{SHA256}:{computed}"),
        });
    }

    Ok(())
}

/// OCI image manifest.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Schema version.
    pub schema_version: u32,
    /// Media type.
    #[serde(default)]
    pub media_type: Option<String>,
    /// Config descriptor; for a bundle this is the bundle document.
    pub config: Descriptor,
    /// Layer descriptors.
    #[serde(default)]
    pub layers: Vec<Descriptor>,
}

/// Content descriptor.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Media type of the referenced content.
    pub media_type: String,
    /// Digest of the content.
    pub digest: String,
    /// Size in bytes.
    pub size: u64,
}
