//! # bndl-registry
//!
//! Pulls bundle documents from container registries over the OCI
//! distribution API, for use as the [`RemotePuller`](bndl_store::RemotePuller)
//! behind a [`BundleStore`](bndl_store::BundleStore).
//!
//! This module handles:
//! - Resolving a reference to a registry endpoint (default registry,
//!   insecure registries over plain HTTP)
//! - Loading per-registry CA and client certificates from a `certs.d` tree
//! - Fetching the manifest and the bundle document blob
//! - Verifying sha256 digests of both

mod client;
mod config;
mod endpoint;
mod error;
mod tls;

pub use client::{Descriptor, Manifest, RegistryPuller};
pub use config::{RegistryConfig, DEFAULT_CERTS_DIR};
pub use endpoint::Endpoint;
pub use error::RegistryError;
pub use tls::{load_host_certificates, HostCertificates};
