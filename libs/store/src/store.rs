//! Bundle store backed by a directory tree.
//!
//! Each entry is one JSON file at the path [`codec::encode`] derives from
//! its reference. There is no locking: concurrent stores of the same
//! reference race and the last rename wins, while stores of different
//! references touch disjoint files.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bndl_reference::codec::{self, FILE_EXTENSION};
use bndl_reference::Reference;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::BundleDocument;
use crate::error::StoreError;
use crate::puller::RemotePuller;

/// Prefix of in-flight temporary files. They never carry the `.json`
/// extension, so listings skip them.
const TEMP_FILE_PREFIX: &str = ".tmp-";

/// Local cache of bundle documents keyed by reference.
#[derive(Debug, Clone)]
pub struct BundleStore {
    root: PathBuf,
}

impl BundleStore {
    /// Create a store rooted at `root`. The directory is created lazily by
    /// the first [`store`](Self::store).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the entry for a reference.
    pub fn path_for(&self, reference: &Reference) -> PathBuf {
        self.root.join(codec::encode(reference))
    }

    /// Check whether an entry exists for a reference.
    pub fn contains(&self, reference: &Reference) -> bool {
        self.path_for(reference).is_file()
    }

    /// Write a document, creating intermediate directories as needed.
    ///
    /// The document goes to a temporary file in the entry's directory and
    /// is renamed into place, so the entry is either the previous version
    /// or the new one.
    pub fn store(&self, reference: &Reference, document: &BundleDocument) -> Result<(), StoreError> {
        let path = self.path_for(reference);

        let contents = document
            .to_vec_pretty()
            .map_err(|e| StoreError::Write {
                reference: reference.clone(),
                source: io::Error::from(e),
            })?;

        write_entry(&path, &contents).map_err(|source| StoreError::Write {
            reference: reference.clone(),
            source,
        })?;

        info!(
            reference = %reference,
            path = %path.display(),
            size = contents.len(),
            "Stored bundle"
        );

        Ok(())
    }

    /// Read the document stored for a reference.
    pub fn read(&self, reference: &Reference) -> Result<BundleDocument, StoreError> {
        let path = self.path_for(reference);

        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    reference: reference.clone(),
                });
            }
            Err(source) => {
                return Err(StoreError::Read {
                    reference: reference.clone(),
                    source,
                });
            }
        };

        BundleDocument::from_slice(&data).map_err(|source| StoreError::Parse {
            reference: reference.clone(),
            source,
        })
    }

    /// List every reference in the store, sorted by repository name.
    ///
    /// The order among entries of the same repository is the walk order
    /// (file names ascending). A `.json` file whose path does not decode
    /// fails the whole listing. A missing root lists as empty.
    pub fn list(&self) -> Result<Vec<Reference>, StoreError> {
        match fs::metadata(&self.root) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Walk {
                    path: self.root.clone(),
                    source,
                });
            }
        }

        let mut references = Vec::new();
        self.walk(&mut references)?;

        // Stable, so the walk order breaks ties.
        references.sort_by(|a, b| a.name().cmp(b.name()));

        debug!(
            root = %self.root.display(),
            count = references.len(),
            "Listed bundle store"
        );

        Ok(references)
    }

    fn walk(&self, references: &mut Vec<Reference>) -> Result<(), StoreError> {
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(self.root.as_path()).to_path_buf();
                StoreError::Walk {
                    path,
                    source: e.into(),
                }
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            // Compared as raw bytes so non-UTF-8 names reach the decoder.
            let is_entry = entry
                .file_name()
                .as_encoded_bytes()
                .ends_with(FILE_EXTENSION.as_bytes());
            if !is_entry {
                continue;
            }

            let path = entry.path();
            let reference = codec::decode(path, &self.root).map_err(|e| {
                warn!(path = %path.display(), error = %e, "Malformed bundle store entry");
                StoreError::MalformedPath(e)
            })?;
            references.push(reference);
        }

        Ok(())
    }

    /// Return the document for a reference, pulling it on a cache miss.
    ///
    /// A bare [`Repository`](bndl_reference::Repository) is normalized to
    /// its `latest` tag first. Unless `force_pull` is set, a local entry is
    /// returned without touching the puller; read errors other than
    /// [`StoreError::NotFound`] are surfaced rather than pulled over. A
    /// pulled document is stored under the same reference before it is
    /// returned. Pull failures carry the reference as the caller wrote it.
    pub async fn lookup_or_pull<R, P>(
        &self,
        reference: R,
        force_pull: bool,
        puller: &P,
    ) -> Result<BundleDocument, StoreError>
    where
        R: Into<Reference> + fmt::Display,
        P: RemotePuller + ?Sized,
    {
        let original = reference.to_string();
        self.pull_through(&original, reference.into(), force_pull, puller)
            .await
    }

    /// [`lookup_or_pull`](Self::lookup_or_pull) for a reference string.
    ///
    /// A string with neither tag nor digest gets the `latest` tag.
    /// Unparseable input fails with [`StoreError::InvalidReference`].
    pub async fn lookup_or_pull_str<P>(
        &self,
        reference: &str,
        force_pull: bool,
        puller: &P,
    ) -> Result<BundleDocument, StoreError>
    where
        P: RemotePuller + ?Sized,
    {
        let parsed =
            Reference::parse_tag_name_only(reference).map_err(StoreError::InvalidReference)?;
        self.pull_through(reference, parsed, force_pull, puller).await
    }

    async fn pull_through<P>(
        &self,
        original: &str,
        reference: Reference,
        force_pull: bool,
        puller: &P,
    ) -> Result<BundleDocument, StoreError>
    where
        P: RemotePuller + ?Sized,
    {
        if !force_pull {
            match self.read(&reference) {
                Ok(document) => {
                    debug!(reference = %reference, "Bundle store cache hit");
                    return Ok(document);
                }
                Err(e) if e.is_not_found() => {
                    debug!(reference = %reference, "Bundle store cache miss");
                }
                Err(e) => return Err(e),
            }
        }

        info!(reference = %reference, force_pull, "Pulling bundle");

        let document = puller
            .pull(&reference)
            .await
            .map_err(|source| StoreError::Pull {
                reference: original.to_string(),
                source,
            })?;

        self.store(&reference, &document)?;

        Ok(document)
    }
}

/// Write `contents` to `path` through a temporary file in the same
/// directory.
fn write_entry(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "entry path has no parent directory")
    })?;

    // Tolerates directories created concurrently by other writers.
    fs::create_dir_all(dir)?;

    let mut file = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .tempfile_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }

    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reference(s: &str) -> Reference {
        Reference::parse(s).unwrap()
    }

    fn document(value: serde_json::Value) -> BundleDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_store_creates_entry_at_codec_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = BundleStore::new(dir.path());

        store
            .store(&reference("a/b:1.0"), &document(json!({"name": "b"})))
            .unwrap();

        let expected = dir.path().join("a").join("b").join("_tags").join("1.0.json");
        assert!(expected.is_file());
        let written: serde_json::Value =
            serde_json::from_slice(&fs::read(&expected).unwrap()).unwrap();
        assert_eq!(written, json!({"name": "b"}));
    }

    #[test]
    fn test_read_returns_stored_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = BundleStore::new(dir.path());
        let r = reference("a/b:1.0");

        store.store(&r, &document(json!({"name": "b"}))).unwrap();

        assert_eq!(store.read(&r).unwrap(), document(json!({"name": "b"})));
        assert!(store.contains(&r));
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = BundleStore::new(dir.path());
        store
            .store(&reference("a/b:1.0"), &document(json!({"name": "b"})))
            .unwrap();

        let err = store.read(&reference("a/b:2.0")).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("a/b:2.0"));
    }

    #[test]
    fn test_read_corrupt_entry_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = BundleStore::new(dir.path());
        let r = reference("a/b:1.0");

        let path = store.path_for(&r);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"{ truncated").unwrap();

        assert!(matches!(store.read(&r), Err(StoreError::Parse { .. })));
    }

    #[test]
    fn test_store_overwrites_previous_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = BundleStore::new(dir.path());
        let r = reference("a/b@sha256:deadbeef");

        store.store(&r, &document(json!({"version": "1"}))).unwrap();
        store.store(&r, &document(json!({"version": "2"}))).unwrap();

        assert_eq!(store.read(&r).unwrap().version(), Some("2"));
    }

    #[test]
    fn test_store_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = BundleStore::new(dir.path());
        let r = reference("a/b:1.0");
        store.store(&r, &document(json!({}))).unwrap();

        let names: Vec<_> = fs::read_dir(store.path_for(&r).parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("1.0.json")]);
    }

    #[test]
    fn test_list_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = BundleStore::new(dir.path().join("does-not-exist"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_skips_non_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = BundleStore::new(dir.path());
        store
            .store(&reference("a/b:1.0"), &document(json!({})))
            .unwrap();
        fs::write(dir.path().join("README"), b"notes").unwrap();
        fs::write(
            store.path_for(&reference("a/b:1.0")).with_file_name(".tmp-abc"),
            b"partial",
        )
        .unwrap();

        assert_eq!(store.list().unwrap(), vec![reference("a/b:1.0")]);
    }

    #[test]
    fn test_list_fails_on_malformed_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = BundleStore::new(dir.path());
        store
            .store(&reference("a/b:1.0"), &document(json!({})))
            .unwrap();

        let stray = dir.path().join("a").join("b").join("stray.json");
        fs::write(&stray, b"{}").unwrap();

        let err = store.list().unwrap_err();
        assert!(matches!(err, StoreError::MalformedPath(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_list_fails_on_non_utf8_entry() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let store = BundleStore::new(dir.path());
        let r = reference("a/b:1.0");
        store.store(&r, &document(json!({}))).unwrap();

        let name = OsStr::from_bytes(b"\xff\xfe.json");
        fs::write(store.path_for(&r).with_file_name(name), b"{}").unwrap();

        let err = store.list().unwrap_err();
        assert!(matches!(err, StoreError::MalformedPath(_)));
    }

    #[test]
    fn test_list_visits_nested_repositories_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = BundleStore::new(dir.path());
        for r in ["b/x:1", "a/y/z:2", "a/y:3", "a/y:1"] {
            store.store(&reference(r), &document(json!({}))).unwrap();
        }

        let listed: Vec<String> = store.list().unwrap().iter().map(ToString::to_string).collect();
        assert_eq!(listed, vec!["a/y:1", "a/y:3", "a/y/z:2", "b/x:1"]);
    }
}
