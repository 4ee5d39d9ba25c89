//! Mapping between references and store-relative file paths.
//!
//! ```text
//! <name with first ':' as '_'>/_tags/<tag>.json
//! <name with first ':' as '_'>/_digests/<algorithm>/<encoded>.json
//! ```
//!
//! `:` is not usable in paths on every platform, so the single `:` a name
//! may contain (the registry port separator) is stored as `_`. The first
//! name component never contains `_`, so the substitution is reversible.
//! Components never start with `_`, so the `_tags` and `_digests` markers
//! cannot collide with a repository component.

use std::path::{Component, Path, PathBuf};

use crate::error::ReferenceError;
use crate::reference::Reference;

/// Directory marker preceding a tag file.
pub const TAGS_DIR: &str = "_tags";

/// Directory marker preceding a digest algorithm directory.
pub const DIGESTS_DIR: &str = "_digests";

/// Extension every bundle document file carries.
pub const FILE_EXTENSION: &str = ".json";

/// Encodes a reference as a path relative to the store root.
#[must_use]
pub fn encode(reference: &Reference) -> PathBuf {
    let name = reference.name().replacen(':', "_", 1);
    let mut path: PathBuf = name.split('/').collect();

    match reference {
        Reference::Digested { digest, .. } => {
            path.push(DIGESTS_DIR);
            path.push(digest.algorithm());
            path.push(format!("{}{FILE_EXTENSION}", digest.encoded()));
        }
        Reference::Tagged { tag, .. } => {
            path.push(TAGS_DIR);
            path.push(format!("{tag}{FILE_EXTENSION}"));
        }
    }

    path
}

/// Decodes a path previously produced by [`encode`] under `root`.
pub fn decode(path: &Path, root: &Path) -> Result<Reference, ReferenceError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ReferenceError::malformed(path, "path is outside the store root"))?;

    let mut segments = Vec::new();
    for component in relative.components() {
        let Component::Normal(segment) = component else {
            return Err(ReferenceError::malformed(path, "unexpected path component"));
        };
        let segment = segment
            .to_str()
            .ok_or_else(|| ReferenceError::malformed(path, "path is not valid UTF-8"))?;
        segments.push(segment);
    }

    if segments.len() < 3 {
        return Err(ReferenceError::malformed(path, "too few path segments"));
    }

    let last = segments.len() - 1;
    let file_name = segments[last];
    segments[last] = file_name.strip_suffix(FILE_EXTENSION).ok_or_else(|| {
        ReferenceError::malformed(path, "not referencing a bundle in JSON format")
    })?;

    let reference =
        reconstruct(&segments).map_err(|reason| ReferenceError::malformed(path, reason))?;

    Reference::parse(&reference).map_err(|e| ReferenceError::malformed(path, e.to_string()))
}

/// Rebuilds the reference string from path segments (without extension).
fn reconstruct(segments: &[&str]) -> Result<String, &'static str> {
    let Some((first, rest)) = segments.split_first() else {
        return Err("empty path");
    };

    let mut name = first.replacen('_', ":", 1);
    for (i, segment) in rest.iter().enumerate() {
        match *segment {
            TAGS_DIR => {
                if i + 2 != rest.len() {
                    return Err("tag marker is not the second-to-last segment");
                }
                return Ok(format!("{name}:{}", rest[i + 1]));
            }
            DIGESTS_DIR => {
                if i + 3 != rest.len() {
                    return Err("digest marker is not the third-to-last segment");
                }
                return Ok(format!("{name}@{}:{}", rest[i + 1], rest[i + 2]));
            }
            _ => {
                name.push('/');
                name.push_str(segment);
            }
        }
    }

    Err("missing tag or digest marker")
}
