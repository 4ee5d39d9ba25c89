//! Inspect command.

use anyhow::Result;
use bndl_reference::Reference;
use bndl_store::{BundleDocument, BundleStore, RemotePuller};
use clap::Args;

use crate::error::CliError;
use crate::output::print_single;

use super::CommandContext;

/// Print a bundle document.
#[derive(Debug, Args)]
pub struct InspectCommand {
    /// Bundle reference, e.g. `myrepo/myapp:0.1.0`.
    reference: String,

    /// Pull even if the bundle is already cached.
    #[arg(long)]
    pull: bool,
}

impl InspectCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let document = inspect(&ctx.store, &ctx.puller, &self.reference, self.pull).await?;
        print_single(&document);
        Ok(())
    }
}

async fn inspect<P: RemotePuller + ?Sized>(
    store: &BundleStore,
    puller: &P,
    reference: &str,
    force_pull: bool,
) -> Result<BundleDocument, CliError> {
    let reference = Reference::parse_normalized(reference)?;
    Ok(store.lookup_or_pull(reference, force_pull, puller).await?)
}

#[cfg(test)]
mod tests {
    use bndl_store::StoreError;
    use bndl_testing::{bundle, reference, FakePuller};
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_inspect_uses_cache() {
        let temp_dir = TempDir::new().unwrap();
        let store = BundleStore::new(temp_dir.path());
        let cached = bundle("myapp", "0.1.0");
        store
            .store(&reference("ghcr.io/team/myapp:0.1.0"), &cached)
            .unwrap();
        let puller = FakePuller::failing();

        let document = inspect(&store, &puller, "ghcr.io/team/myapp:0.1.0", false)
            .await
            .unwrap();

        assert_eq!(document, cached);
        assert_eq!(puller.call_count(), 0);
    }

    #[tokio::test]
    async fn test_inspect_with_pull_refreshes() {
        let temp_dir = TempDir::new().unwrap();
        let store = BundleStore::new(temp_dir.path());
        let r = reference("ghcr.io/team/myapp:0.1.0");
        store.store(&r, &bundle("myapp", "stale")).unwrap();
        let puller = FakePuller::new().with_document(r.clone(), bundle("myapp", "0.1.0"));

        let document = inspect(&store, &puller, "ghcr.io/team/myapp:0.1.0", true)
            .await
            .unwrap();

        assert_eq!(document.version(), Some("0.1.0"));
        assert_eq!(store.read(&r).unwrap().version(), Some("0.1.0"));
    }

    #[tokio::test]
    async fn test_inspect_surfaces_registry_miss() {
        let temp_dir = TempDir::new().unwrap();
        let store = BundleStore::new(temp_dir.path());
        let puller = FakePuller::new();

        let err = inspect(&store, &puller, "ghcr.io/team/missing:1", false)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Store(StoreError::Pull { .. })));
    }
}
