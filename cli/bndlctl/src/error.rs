//! Error handling and display for the CLI.

use bndl_reference::ReferenceError;
use bndl_store::{PullError, StoreError};
use colored::Colorize;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(hint) = err.downcast_ref::<CliError>().and_then(hint) {
        eprintln!("\n{}", hint.yellow());
    }
}

fn hint(err: &CliError) -> Option<&'static str> {
    match err {
        CliError::Reference(_) | CliError::Store(StoreError::InvalidReference(_)) => {
            Some("Hint: References look like `[registry/]repository[:tag|@digest]`.")
        }
        CliError::Store(StoreError::NotFound { .. }) => {
            Some("Hint: Run `bndl pull <reference>` or pass `--pull` to fetch it.")
        }
        CliError::Store(StoreError::Parse { .. }) => {
            Some("Hint: The cached copy is corrupt. Run `bndl pull <reference>` to replace it.")
        }
        CliError::Store(StoreError::MalformedPath(_)) => {
            Some("Hint: Remove stray files from the store directory.")
        }
        CliError::Store(StoreError::Pull { source, .. }) => match source {
            PullError::NotFound(_) => Some("Hint: Check the repository name and tag."),
            PullError::Unauthorized(_) => {
                Some("Hint: Set `BNDL_AUTH_TOKEN` or `auth_token` in the config file.")
            }
            PullError::InvalidBundle(_) => None,
            PullError::Transport(_) => Some(
                "Hint: Check your network connection. Use `--insecure-registry` for plain-HTTP registries.",
            ),
        },
        CliError::Store(_) => None,
    }
}
