//! Repository names.
//!
//! A repository name is a `/`-separated list of components:
//!
//! - The first component is either a registry host (`host` or `host:port`)
//!   or an ordinary path component. It never contains `_`, which leaves `_`
//!   free to stand in for the port separator on disk.
//! - Every other component is lowercase alphanumerics joined by `.`, `_`,
//!   `__` or a run of `-`. Components never start or end with a separator.
//!
//! A name therefore holds at most one `:`, and no component can ever be
//! spelled `_tags` or `_digests`.

use std::fmt;
use std::str::FromStr;

use crate::error::ReferenceError;

/// Maximum length of a full repository name.
pub const NAME_TOTAL_LENGTH_MAX: usize = 255;

/// A validated repository name, e.g. `myrepo/myapp` or
/// `localhost:5000/team/app`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Repository(String);

impl Repository {
    /// Parses and validates a repository name.
    pub fn parse(s: &str) -> Result<Self, ReferenceError> {
        validate_name(s).map_err(|reason| ReferenceError::invalid(s, reason))?;
        Ok(Self(s.to_string()))
    }

    /// Builds a repository from a name already checked by [`validate_name`].
    pub(crate) fn from_validated(name: String) -> Self {
        Self(name)
    }

    /// Returns the full name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns the registry host (with port, if any) when the first
    /// component names one.
    ///
    /// A first component is a host if it contains `.` or `:`, or is
    /// `localhost`, and is followed by at least one more component.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        let (first, _) = self.0.split_once('/')?;
        is_domain_like(first).then_some(first)
    }

    /// Returns the name without its registry host.
    #[must_use]
    pub fn path(&self) -> &str {
        match self.domain() {
            Some(domain) => &self.0[domain.len() + 1..],
            None => &self.0,
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Repository {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Repository {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for Repository {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Repository {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Whether a leading component should be read as a registry host.
pub(crate) fn is_domain_like(component: &str) -> bool {
    component.contains('.') || component.contains(':') || component == "localhost"
}

/// Validates a full repository name, returning the reason on failure.
pub(crate) fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("repository name cannot be empty".to_string());
    }
    if name.len() > NAME_TOTAL_LENGTH_MAX {
        return Err(format!(
            "repository name must not be more than {NAME_TOTAL_LENGTH_MAX} characters"
        ));
    }

    let mut components = name.split('/');
    let first = components.next().unwrap_or_default();
    let has_more = name.contains('/');

    if let Some((host, port)) = first.split_once(':') {
        // A trailing `:port` with nothing after it would read back as a tag.
        if !has_more {
            return Err(format!(
                "registry host {first:?} must be followed by a repository path"
            ));
        }
        validate_host(host)?;
        validate_port(port)?;
    } else {
        if first.contains('_') {
            return Err(format!(
                "first name component {first:?} cannot contain '_'"
            ));
        }
        validate_path_component(first)?;
    }

    for component in components {
        validate_path_component(component)?;
    }

    Ok(())
}

fn is_lower_alnum(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

fn is_separator(sep: &str) -> bool {
    matches!(sep, "." | "_" | "__") || (!sep.is_empty() && sep.bytes().all(|b| b == b'-'))
}

fn validate_path_component(component: &str) -> Result<(), String> {
    if component.is_empty() {
        return Err("repository name has an empty path component".to_string());
    }

    let starts_ok = component.chars().next().is_some_and(is_lower_alnum);
    let ends_ok = component.chars().next_back().is_some_and(is_lower_alnum);
    if !starts_ok || !ends_ok {
        return Err(format!(
            "path component {component:?} must start and end with a lowercase letter or digit"
        ));
    }

    let mut rest = component;
    while let Some(start) = rest.find(|c: char| !is_lower_alnum(c)) {
        let tail = &rest[start..];
        let end = tail.find(is_lower_alnum).unwrap_or(tail.len());
        let sep = &tail[..end];
        if !is_separator(sep) {
            return Err(format!(
                "path component {component:?} contains invalid characters {sep:?}"
            ));
        }
        rest = &tail[end..];
    }

    Ok(())
}

fn validate_host(host: &str) -> Result<(), String> {
    if host.is_empty() {
        return Err("registry host cannot be empty".to_string());
    }

    for label in host.split('.') {
        let valid = !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| is_lower_alnum(c) || c == '-');
        if !valid {
            return Err(format!("invalid registry host {host:?}"));
        }
    }

    Ok(())
}

fn validate_port(port: &str) -> Result<(), String> {
    let valid = !port.is_empty() && port.len() <= 5 && port.bytes().all(|b| b.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(format!("invalid registry port {port:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_names() {
        for name in ["app", "myrepo/myapp", "a/b/c/d", "my-org/my.app", "org/my_app", "org/a__b"] {
            assert!(Repository::parse(name).is_ok(), "{name} should parse");
        }
    }

    #[test]
    fn test_host_with_port() {
        let repo = Repository::parse("localhost:5000/team/app").unwrap();
        assert_eq!(repo.domain(), Some("localhost:5000"));
        assert_eq!(repo.path(), "team/app");
    }

    #[test]
    fn test_domain_detection() {
        assert_eq!(Repository::parse("ghcr.io/org/app").unwrap().domain(), Some("ghcr.io"));
        assert_eq!(Repository::parse("localhost/app").unwrap().domain(), Some("localhost"));
        assert_eq!(Repository::parse("myrepo/myapp").unwrap().domain(), None);
        assert_eq!(Repository::parse("ghcr.io").unwrap().domain(), None);
    }

    #[test]
    fn test_rejects_underscore_in_first_component() {
        let err = Repository::parse("localhost_5000/app").unwrap_err();
        assert!(err.is_invalid_reference());
    }

    #[test]
    fn test_rejects_marker_like_components() {
        assert!(Repository::parse("a/_tags").is_err());
        assert!(Repository::parse("a/_digests/b").is_err());
        assert!(Repository::parse("a/b_").is_err());
    }

    #[test]
    fn test_rejects_bad_names() {
        for name in [
            "",
            "UPPER/app",
            "a//b",
            "a/",
            "/a",
            "a/b:c/d",
            "host:port/app",
            "host:5000",
            "a/b...c",
            "a/b___c",
            "a/-b",
        ] {
            assert!(Repository::parse(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn test_rejects_long_names() {
        let name = format!("a/{}", "b".repeat(NAME_TOTAL_LENGTH_MAX));
        assert!(Repository::parse(&name).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let repo = Repository::parse("registry.example.com:443/a/b").unwrap();
        let json = serde_json::to_string(&repo).unwrap();
        assert_eq!(json, "\"registry.example.com:443/a/b\"");
        let parsed: Repository = serde_json::from_str(&json).unwrap();
        assert_eq!(repo, parsed);
    }
}
