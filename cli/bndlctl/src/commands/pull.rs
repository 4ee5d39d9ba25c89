//! Pull command.

use anyhow::Result;
use bndl_reference::Reference;
use bndl_store::{BundleDocument, BundleStore, RemotePuller};
use clap::Args;
use serde::Serialize;

use crate::error::CliError;
use crate::output::{print_single, print_success, OutputFormat};

use super::CommandContext;

/// Pull a bundle, replacing any cached copy.
#[derive(Debug, Args)]
pub struct PullCommand {
    /// Bundle reference, e.g. `myrepo/myapp:0.1.0`.
    reference: String,
}

impl PullCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let summary = pull_bundle(&ctx.store, &ctx.puller, &self.reference).await?;

        match ctx.format {
            OutputFormat::Table => {
                print_success(&summary.message());
                for image in &summary.images {
                    println!("  {} -> {}", image.service, image.image);
                }
            }
            OutputFormat::Json => print_single(&summary),
        }
        Ok(())
    }
}

/// What a pull fetched.
#[derive(Debug, Serialize)]
struct PullSummary {
    reference: Reference,
    name: Option<String>,
    version: Option<String>,
    images: Vec<ImageSummary>,
}

/// An image the bundle refers to. Images are reported, not pulled.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct ImageSummary {
    service: String,
    image: String,
}

impl PullSummary {
    fn new(reference: Reference, document: &BundleDocument) -> Self {
        Self {
            reference,
            name: document.name().map(String::from),
            version: document.version().map(String::from),
            images: document
                .images()
                .into_iter()
                .map(|i| ImageSummary {
                    service: i.service.to_string(),
                    image: i.image.to_string(),
                })
                .collect(),
        }
    }

    fn message(&self) -> String {
        format!(
            "Successfully pulled {:?} ({}) from {}",
            self.name.as_deref().unwrap_or_default(),
            self.version.as_deref().unwrap_or_default(),
            self.reference
        )
    }
}

async fn pull_bundle<P: RemotePuller + ?Sized>(
    store: &BundleStore,
    puller: &P,
    reference: &str,
) -> Result<PullSummary, CliError> {
    let reference = Reference::parse_normalized(reference)?;
    let document = store.lookup_or_pull(reference.clone(), true, puller).await?;
    Ok(PullSummary::new(reference, &document))
}

#[cfg(test)]
mod tests {
    use bndl_testing::{bundle, reference, FakePuller};
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_pull_normalizes_and_stores() {
        let temp_dir = TempDir::new().unwrap();
        let store = BundleStore::new(temp_dir.path());
        let stored_as = reference("docker.io/myrepo/myapp:0.1.0");
        let puller = FakePuller::new().with_document(stored_as.clone(), bundle("myapp", "0.1.0"));

        let summary = pull_bundle(&store, &puller, "myrepo/myapp:0.1.0").await.unwrap();

        assert_eq!(summary.reference, stored_as);
        assert_eq!(
            summary.message(),
            "Successfully pulled \"myapp\" (0.1.0) from docker.io/myrepo/myapp:0.1.0"
        );
        assert_eq!(puller.calls(), vec![stored_as.clone()]);
        assert!(store.contains(&stored_as));
    }

    #[tokio::test]
    async fn test_pull_always_contacts_registry() {
        let temp_dir = TempDir::new().unwrap();
        let store = BundleStore::new(temp_dir.path());
        let stored_as = reference("docker.io/library/alpine:latest");
        let puller = FakePuller::new().with_document(stored_as.clone(), bundle("alpine", "1"));

        pull_bundle(&store, &puller, "alpine").await.unwrap();
        pull_bundle(&store, &puller, "alpine").await.unwrap();

        assert_eq!(puller.call_count(), 2);
    }

    #[tokio::test]
    async fn test_pull_rejects_invalid_reference() {
        let temp_dir = TempDir::new().unwrap();
        let store = BundleStore::new(temp_dir.path());
        let puller = FakePuller::new();

        let err = pull_bundle(&store, &puller, "Not A Ref").await.unwrap_err();
        assert!(matches!(err, CliError::Reference(_)));
        assert_eq!(puller.call_count(), 0);
    }
}
