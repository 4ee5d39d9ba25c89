//! CLI commands.

mod inspect;
mod list;
mod pull;

use std::path::PathBuf;

use anyhow::Result;
use bndl_registry::RegistryPuller;
use bndl_store::BundleStore;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::Config;
use crate::logging::{self, LogFormat};
use crate::output::OutputFormat;

/// bndl - Pull, cache and inspect application bundles.
#[derive(Debug, Parser)]
#[command(name = "bndl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Bundle store directory (overrides config and BNDL_STORE_DIR).
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Registry to reach over plain HTTP (repeatable).
    #[arg(long = "insecure-registry", global = true)]
    insecure_registries: Vec<String>,

    /// Log line format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Pull a bundle from its registry into the store.
    Pull(pull::PullCommand),

    /// Show a bundle document, pulling it if it is not cached.
    Inspect(inspect::InspectCommand),

    /// List the bundles in the store.
    List(list::ListCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;
        if let Some(dir) = self.store_dir {
            config.store_dir = Some(dir);
        }
        config.insecure_registries.extend(self.insecure_registries);

        logging::init(config.log_level(), self.log_format);

        let ctx = CommandContext::new(config, self.format)?;
        debug!(store = ?ctx.store.root(), "Using bundle store");

        match self.command {
            Commands::Pull(cmd) => cmd.run(ctx).await,
            Commands::Inspect(cmd) => cmd.run(ctx).await,
            Commands::List(cmd) => cmd.run(ctx),
            Commands::Version => {
                println!("bndl {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub format: OutputFormat,
    pub store: BundleStore,
    pub puller: RegistryPuller,
}

impl CommandContext {
    fn new(config: Config, format: OutputFormat) -> Result<Self> {
        Ok(Self {
            format,
            store: BundleStore::new(config.store_dir()?),
            puller: RegistryPuller::new(config.registry_config()),
        })
    }
}
