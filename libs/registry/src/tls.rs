//! Per-registry TLS material from a `certs.d`-style directory.
//!
//! For a registry `host[:port]`, `<certs_dir>/<host[:port]>/` may hold:
//! - `*.crt`: extra root CA certificates
//! - `*.cert` + `*.key`: a client certificate and its private key
//!
//! A `.cert` without its `.key` (or the reverse) is an error. A missing
//! directory means no extra material.

use std::fs;
use std::io;
use std::path::Path;

use reqwest::{Certificate, Identity};
use tracing::{debug, warn};

use crate::error::RegistryError;

/// TLS material loaded for one registry host.
#[derive(Default)]
pub struct HostCertificates {
    pub root_certificates: Vec<Certificate>,
    pub identity: Option<Identity>,
}

impl std::fmt::Debug for HostCertificates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCertificates")
            .field("root_certificates", &self.root_certificates.len())
            .field("identity", &self.identity.is_some())
            .finish()
    }
}

/// Load the TLS material for `host` from `certs_dir`.
pub fn load_host_certificates(certs_dir: &Path, host: &str) -> Result<HostCertificates, RegistryError> {
    let host_dir = certs_dir.join(host);

    let mut names = match fs::read_dir(&host_dir) {
        Ok(entries) => entries
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<Result<Vec<_>, _>>()?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HostCertificates::default()),
        Err(e) => return Err(e.into()),
    };
    names.sort();

    check_key_pairs(&names)?;

    let mut certs = HostCertificates::default();

    for name in &names {
        if name.ends_with(".crt") {
            let pem = fs::read(host_dir.join(name))?;
            let cert = Certificate::from_pem(&pem)
                .map_err(|e| RegistryError::Tls(format!("invalid CA certificate {name}: {e}")))?;
            certs.root_certificates.push(cert);
            debug!(host = %host, file = %name, "Loaded registry CA certificate");
        }

        if let Some(stem) = name.strip_suffix(".cert") {
            if certs.identity.is_some() {
                warn!(host = %host, file = %name, "Ignoring additional client certificate");
                continue;
            }

            let mut pem = fs::read(host_dir.join(name))?;
            pem.push(b'\n');
            pem.extend(fs::read(host_dir.join(format!("{stem}.key")))?);

            let identity = Identity::from_pem(&pem)
                .map_err(|e| RegistryError::Tls(format!("invalid client certificate {name}: {e}")))?;
            certs.identity = Some(identity);
            debug!(host = %host, file = %name, "Loaded registry client certificate");
        }
    }

    Ok(certs)
}

/// Every `.cert` needs a `.key` of the same stem, and the reverse.
fn check_key_pairs(names: &[String]) -> Result<(), RegistryError> {
    let has = |name: String| names.iter().any(|n| *n == name);

    for name in names {
        if let Some(stem) = name.strip_suffix(".cert") {
            if !has(format!("{stem}.key")) {
                return Err(RegistryError::Tls(format!(
                    "missing key {stem}.key for client certificate {name}. \
                     Note that CA certificates should use the extension .crt"
                )));
            }
        }
        if let Some(stem) = name.strip_suffix(".key") {
            if !has(format!("{stem}.cert")) {
                return Err(RegistryError::Tls(format!(
                    "missing client certificate {stem}.cert for key {name}"
                )));
            }
        }
    }

    Ok(())
}
