//! bndlctl (bndl) - CLI for the local bundle store
//!
//! Pulls application bundles from registries into the local store,
//! inspects cached bundles and lists what the store holds.

use anyhow::Result;
use clap::Parser;

mod commands;
mod config;
mod error;
mod logging;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
