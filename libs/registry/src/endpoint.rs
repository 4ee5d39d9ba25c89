//! Resolution of references to registry endpoints.

use bndl_reference::{Reference, DEFAULT_DOMAIN};

use crate::config::RegistryConfig;

/// API host serving the default registry.
const DEFAULT_REGISTRY_HOST: &str = "registry-1.docker.io";

/// Where and how to reach the repository a reference names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Registry host as written in the reference (`docker.io` when absent).
    pub host: String,
    /// Repository path on the registry.
    pub path: String,
    /// Scheme and authority, e.g. `https://ghcr.io`.
    pub base_url: String,
    /// Whether the registry is reached over plain HTTP.
    pub insecure: bool,
}

impl Endpoint {
    /// Resolve the endpoint for a reference.
    ///
    /// - `ghcr.io/org/app:v1` -> `https://ghcr.io`, `org/app`
    /// - `myrepo/myapp:0.1.0` -> `https://registry-1.docker.io`, `myrepo/myapp`
    /// - `docker.io/alpine:3` -> `https://registry-1.docker.io`, `library/alpine`
    pub fn resolve(reference: &Reference, config: &RegistryConfig) -> Self {
        let repository = reference.repository();
        let host = repository.domain().unwrap_or(DEFAULT_DOMAIN).to_string();

        let mut path = repository.path().to_string();
        if host == DEFAULT_DOMAIN && !path.contains('/') {
            path = format!("library/{path}");
        }

        let api_host = if host == DEFAULT_DOMAIN {
            DEFAULT_REGISTRY_HOST
        } else {
            host.as_str()
        };

        let insecure = config.is_insecure(&host);
        let scheme = if insecure { "http" } else { "https" };
        let base_url = format!("{scheme}://{api_host}");

        Self {
            host,
            path,
            base_url,
            insecure,
        }
    }

    pub fn manifest_url(&self, reference: &str) -> String {
        format!("{}/v2/{}/manifests/{}", self.base_url, self.path, reference)
    }

    pub fn blob_url(&self, digest: &str) -> String {
        format!("{}/v2/{}/blobs/{}", self.base_url, self.path, digest)
    }
}
