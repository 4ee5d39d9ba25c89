//! Tagged and digested references.
//!
//! Accepted forms:
//! - `myrepo/myapp:0.1.0`
//! - `myrepo/myapp@sha256:deadbeef`
//! - `localhost:5000/myapp:0.1.0`
//! - `myrepo/myapp:0.1.0@sha256:deadbeef` (the digest wins, the tag is dropped)
//!
//! A bare name such as `myrepo/myapp` is a [`Repository`], not a
//! [`Reference`]. It only becomes one through tag-name-only normalization,
//! which applies [`DEFAULT_TAG`].

use std::fmt;
use std::str::FromStr;

use crate::digest::{self, Digest};
use crate::error::ReferenceError;
use crate::name::{is_domain_like, validate_name, Repository};

/// Tag applied to references that name neither a tag nor a digest.
pub const DEFAULT_TAG: &str = "latest";

/// Registry assumed for names without a registry host.
pub const DEFAULT_DOMAIN: &str = "docker.io";

/// Namespace for single-component names on the default registry.
const OFFICIAL_REPO_NAMESPACE: &str = "library";

/// Aliases of the default registry that normalize to [`DEFAULT_DOMAIN`].
const DEFAULT_DOMAIN_ALIASES: &[&str] = &["index.docker.io", "registry-1.docker.io"];

/// Maximum tag length.
const TAG_MAX_LEN: usize = 128;

/// A repository plus exactly one of a tag or a digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    Tagged { repository: Repository, tag: String },
    Digested { repository: Repository, digest: Digest },
}

impl Reference {
    /// Creates a tagged reference, validating the tag.
    pub fn tagged(repository: Repository, tag: impl Into<String>) -> Result<Self, ReferenceError> {
        let tag = tag.into();
        validate_tag(&tag)
            .map_err(|reason| ReferenceError::invalid(&format!("{repository}:{tag}"), reason))?;
        Ok(Self::Tagged { repository, tag })
    }

    /// Creates a digested reference.
    #[must_use]
    pub fn digested(repository: Repository, digest: Digest) -> Self {
        Self::Digested { repository, digest }
    }

    /// Creates a reference to the [`DEFAULT_TAG`] of a repository.
    #[must_use]
    pub fn latest(repository: Repository) -> Self {
        Self::Tagged {
            repository,
            tag: DEFAULT_TAG.to_string(),
        }
    }

    /// Parses a reference that must carry a tag or a digest.
    pub fn parse(s: &str) -> Result<Self, ReferenceError> {
        Self::build(s, s, None)
    }

    /// Parses a reference, applying [`DEFAULT_TAG`] when it names neither a
    /// tag nor a digest.
    pub fn parse_tag_name_only(s: &str) -> Result<Self, ReferenceError> {
        Self::build(s, s, Some(DEFAULT_TAG))
    }

    /// Parses a familiar reference the way a container CLI would.
    ///
    /// Names without a registry host are placed on [`DEFAULT_DOMAIN`];
    /// single-component names there are placed in the `library` namespace.
    /// The result is then tag-name-only normalized.
    ///
    /// - `alpine` -> `docker.io/library/alpine:latest`
    /// - `myrepo/myapp:0.1.0` -> `docker.io/myrepo/myapp:0.1.0`
    /// - `localhost:5000/myapp` -> `localhost:5000/myapp:latest`
    pub fn parse_normalized(s: &str) -> Result<Self, ReferenceError> {
        let (domain, remainder) = match s.split_once('/') {
            Some((first, rest)) if is_domain_like(first) => (first, rest),
            _ => (DEFAULT_DOMAIN, s),
        };
        let domain = if DEFAULT_DOMAIN_ALIASES.contains(&domain) {
            DEFAULT_DOMAIN
        } else {
            domain
        };

        let normalized = if domain == DEFAULT_DOMAIN && !remainder.contains('/') {
            format!("{domain}/{OFFICIAL_REPO_NAMESPACE}/{remainder}")
        } else {
            format!("{domain}/{remainder}")
        };

        Self::build(s, &normalized, Some(DEFAULT_TAG))
    }

    fn build(input: &str, s: &str, default_tag: Option<&str>) -> Result<Self, ReferenceError> {
        let parts = split(s);
        validate_name(parts.name).map_err(|reason| ReferenceError::invalid(input, reason))?;
        let repository = Repository::from_validated(parts.name.to_string());

        if let Some(digest) = parts.digest {
            let (algorithm, encoded) =
                digest::split(digest).map_err(|reason| ReferenceError::invalid(input, reason))?;
            if let Some(tag) = parts.tag {
                validate_tag(tag).map_err(|reason| ReferenceError::invalid(input, reason))?;
            }
            let digest = Digest::new(algorithm, encoded)?;
            return Ok(Self::Digested { repository, digest });
        }

        let Some(tag) = parts.tag.or(default_tag) else {
            return Err(ReferenceError::invalid(input, "not tagged or digested"));
        };
        validate_tag(tag).map_err(|reason| ReferenceError::invalid(input, reason))?;

        Ok(Self::Tagged {
            repository,
            tag: tag.to_string(),
        })
    }

    #[must_use]
    pub fn repository(&self) -> &Repository {
        match self {
            Self::Tagged { repository, .. } | Self::Digested { repository, .. } => repository,
        }
    }

    /// Returns the full repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.repository().name()
    }

    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Tagged { tag, .. } => Some(tag),
            Self::Digested { .. } => None,
        }
    }

    #[must_use]
    pub fn digest(&self) -> Option<&Digest> {
        match self {
            Self::Tagged { .. } => None,
            Self::Digested { digest, .. } => Some(digest),
        }
    }
}

impl From<Repository> for Reference {
    /// Tag-name-only normalization.
    fn from(repository: Repository) -> Self {
        Self::latest(repository)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tagged { repository, tag } => write!(f, "{repository}:{tag}"),
            Self::Digested { repository, digest } => write!(f, "{repository}@{digest}"),
        }
    }
}

impl FromStr for Reference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for Reference {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Reference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

struct Parts<'a> {
    name: &'a str,
    tag: Option<&'a str>,
    digest: Option<&'a str>,
}

fn split(s: &str) -> Parts<'_> {
    let (rest, digest) = match s.split_once('@') {
        Some((rest, digest)) => (rest, Some(digest)),
        None => (s, None),
    };

    // A `:` followed by a `/` separates host from port, not name from tag.
    let (name, tag) = match rest.rfind(':') {
        Some(i) if !rest[i + 1..].contains('/') => (&rest[..i], Some(&rest[i + 1..])),
        _ => (rest, None),
    };

    Parts { name, tag, digest }
}

fn validate_tag(tag: &str) -> Result<(), String> {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';

    let mut chars = tag.chars();
    let first_ok = chars.next().is_some_and(is_word);
    let rest_ok = chars.all(|c| is_word(c) || c == '.' || c == '-');

    if !first_ok || !rest_ok || tag.len() > TAG_MAX_LEN {
        return Err(format!("invalid tag {tag:?}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged() {
        let r = Reference::parse("myrepo/myapp:0.1.0").unwrap();
        assert_eq!(r.name(), "myrepo/myapp");
        assert_eq!(r.tag(), Some("0.1.0"));
        assert!(r.digest().is_none());
    }

    #[test]
    fn test_parse_digested() {
        let r = Reference::parse("myrepo/myapp@sha256:deadbeef").unwrap();
        assert_eq!(r.name(), "myrepo/myapp");
        assert_eq!(r.digest().unwrap().to_string(), "sha256:deadbeef");
        assert!(r.tag().is_none());
    }

    #[test]
    fn test_digest_takes_precedence_over_tag() {
        let r = Reference::parse("myrepo/myapp:0.1.0@sha256:deadbeef").unwrap();
        assert!(matches!(r, Reference::Digested { .. }));
        assert_eq!(r.to_string(), "myrepo/myapp@sha256:deadbeef");
    }

    #[test]
    fn test_tag_beside_digest_is_still_validated() {
        assert!(Reference::parse("myrepo/myapp:-bad@sha256:deadbeef").is_err());
    }

    #[test]
    fn test_parse_host_port() {
        let r = Reference::parse("localhost:5000/myapp:1.0").unwrap();
        assert_eq!(r.name(), "localhost:5000/myapp");
        assert_eq!(r.tag(), Some("1.0"));

        let r = Reference::parse("localhost:5000/myapp@sha256:abc").unwrap();
        assert_eq!(r.name(), "localhost:5000/myapp");
    }

    #[test]
    fn test_bare_name_is_rejected() {
        let err = Reference::parse("myrepo/myapp").unwrap_err();
        assert!(err.is_invalid_reference());
        assert!(err.to_string().contains("not tagged or digested"));

        let err = Reference::parse("localhost:5000/myapp").unwrap_err();
        assert!(err.is_invalid_reference());
    }

    #[test]
    fn test_tag_name_only() {
        let r = Reference::parse_tag_name_only("myrepo/myapp").unwrap();
        assert_eq!(r.to_string(), "myrepo/myapp:latest");

        let r = Reference::parse_tag_name_only("myrepo/myapp:0.2").unwrap();
        assert_eq!(r.tag(), Some("0.2"));

        let r = Reference::parse_tag_name_only("myrepo/myapp@sha256:abc").unwrap();
        assert!(r.tag().is_none());
    }

    #[test]
    fn test_from_repository_applies_default_tag() {
        let repo = Repository::parse("a/b").unwrap();
        let r: Reference = repo.into();
        assert_eq!(r.tag(), Some(DEFAULT_TAG));
    }

    #[test]
    fn test_parse_normalized() {
        let cases = [
            ("alpine", "docker.io/library/alpine:latest"),
            ("alpine:3.19", "docker.io/library/alpine:3.19"),
            ("myrepo/myapp:0.1.0", "docker.io/myrepo/myapp:0.1.0"),
            ("index.docker.io/myrepo/myapp", "docker.io/myrepo/myapp:latest"),
            ("ghcr.io/org/app@sha256:abc", "ghcr.io/org/app@sha256:abc"),
            ("localhost:5000/myapp", "localhost:5000/myapp:latest"),
            ("localhost/myapp:dev", "localhost/myapp:dev"),
        ];
        for (input, expected) in cases {
            let r = Reference::parse_normalized(input).unwrap();
            assert_eq!(r.to_string(), expected, "normalizing {input}");
        }
    }

    #[test]
    fn test_invalid_tags() {
        for input in ["a/b:", "a/b:.hidden", "a/b:-x", "a/b:has space"] {
            assert!(Reference::parse(input).is_err(), "{input:?} should be rejected");
        }
        let long = format!("a/b:{}", "t".repeat(TAG_MAX_LEN + 1));
        assert!(Reference::parse(&long).is_err());
    }

    #[test]
    fn test_tagged_constructor_validates() {
        let repo = Repository::parse("a/b").unwrap();
        assert!(Reference::tagged(repo.clone(), "v1").is_ok());
        assert!(Reference::tagged(repo, "bad/tag").is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for input in [
            "a/b:1.0",
            "registry.example.com:8443/team/app:v2",
            "a/b@sha512:0011",
            "x:_underscore",
        ] {
            let r = Reference::parse(input).unwrap();
            assert_eq!(r.to_string(), input);
            assert_eq!(Reference::parse(&r.to_string()).unwrap(), r);
        }
    }

    #[test]
    fn test_json_roundtrip() {
        let r = Reference::parse("a/b@sha256:abcd").unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"a/b@sha256:abcd\"");
        let parsed: Reference = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, r);
    }
}
