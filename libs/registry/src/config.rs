//! Registry client configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default directory holding per-registry TLS material.
pub const DEFAULT_CERTS_DIR: &str = "/etc/docker/certs.d";

/// Configuration for [`RegistryPuller`](crate::RegistryPuller).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry hosts (`host` or `host:port`) reached over plain HTTP.
    pub insecure_registries: Vec<String>,
    /// Directory with a `<host>/` subdirectory of certificates per registry.
    pub certs_dir: Option<PathBuf>,
    /// Optional bearer token sent with every request.
    pub auth_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Max size of a manifest or bundle document.
    pub max_document_size: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            insecure_registries: Vec::new(),
            certs_dir: Some(PathBuf::from(DEFAULT_CERTS_DIR)),
            auth_token: None,
            timeout: Duration::from_secs(60),
            max_document_size: 4 * 1024 * 1024, // 4 MiB
        }
    }
}

impl RegistryConfig {
    /// Whether a registry host is configured as insecure.
    pub fn is_insecure(&self, host: &str) -> bool {
        self.insecure_registries.iter().any(|h| h == host)
    }
}
