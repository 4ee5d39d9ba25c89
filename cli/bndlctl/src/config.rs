//! Configuration for the CLI.
//!
//! Sources, lowest precedence first:
//! - built-in defaults
//! - `config.json` in the platform config directory
//! - `BNDL_*` environment variables
//! - command-line flags (applied by the caller)

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use bndl_registry::{RegistryConfig, DEFAULT_CERTS_DIR};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Configuration file name.
const CONFIG_FILE: &str = "config.json";

/// Log level used when neither config nor env sets one.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Registry request timeout used when none is configured.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "bndl", "bndl")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the bundle store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,

    /// Registry hosts (`host` or `host:port`) reached over plain HTTP.
    pub insecure_registries: Vec<String>,

    /// Directory holding per-registry certificates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certs_dir: Option<PathBuf>,

    /// Bearer token sent to registries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Registry request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load config from disk and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = project_dirs()?.config_dir().join(CONFIG_FILE);

        let mut config = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            Self::from_json(&contents)
                .with_context(|| format!("Failed to parse config from {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Overlay `BNDL_*` variables as returned by `var`.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var("BNDL_STORE_DIR") {
            self.store_dir = Some(PathBuf::from(dir));
        }

        if let Some(dir) = var("BNDL_CERTS_DIR") {
            self.certs_dir = Some(PathBuf::from(dir));
        }

        if let Some(token) = var("BNDL_AUTH_TOKEN") {
            self.auth_token = Some(token);
        }

        if let Some(level) = var("BNDL_LOG_LEVEL") {
            self.log_level = Some(level);
        }

        if let Some(hosts) = var("BNDL_INSECURE_REGISTRIES") {
            self.insecure_registries = hosts
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(String::from)
                .collect();
        }
    }

    /// Store root, defaulting to `<data dir>/bundles`.
    pub fn store_dir(&self) -> Result<PathBuf> {
        match &self.store_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.data_dir().join("bundles")),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Settings for the registry puller.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            insecure_registries: self.insecure_registries.clone(),
            certs_dir: Some(
                self.certs_dir
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CERTS_DIR)),
            ),
            auth_token: self.auth_token.clone(),
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            ..RegistryConfig::default()
        }
    }
}
