//! List command.

use anyhow::Result;
use bndl_reference::Reference;
use bndl_store::BundleStore;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::error::CliError;
use crate::output::print_output;

use super::CommandContext;

/// List cached bundles.
#[derive(Debug, Args)]
pub struct ListCommand {}

impl ListCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let rows = list_bundles(&ctx.store)?;
        print_output(&rows, ctx.format);
        Ok(())
    }
}

/// A row in the bundle listing.
#[derive(Debug, Clone, Serialize, Tabled, PartialEq, Eq)]
struct BundleRow {
    #[tabled(rename = "REPOSITORY")]
    repository: String,

    #[tabled(rename = "TAG", display = "display_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<String>,

    #[tabled(rename = "DIGEST", display = "display_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    digest: Option<String>,
}

fn display_option(opt: &Option<String>) -> String {
    opt.as_deref().unwrap_or("-").to_string()
}

impl From<&Reference> for BundleRow {
    fn from(reference: &Reference) -> Self {
        Self {
            repository: reference.name().to_string(),
            tag: reference.tag().map(String::from),
            digest: reference.digest().map(ToString::to_string),
        }
    }
}

fn list_bundles(store: &BundleStore) -> Result<Vec<BundleRow>, CliError> {
    Ok(store.list()?.iter().map(BundleRow::from).collect())
}
