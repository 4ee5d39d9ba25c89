//! Content digests (`algorithm:encoded`).

use std::fmt;
use std::str::FromStr;

use crate::error::ReferenceError;

/// Algorithm name used by registries for content addressing.
pub const SHA256: &str = "sha256";

/// A content-addressable digest such as `sha256:deadbeef...`.
///
/// The algorithm follows `[a-z0-9]+([+._-][a-z0-9]+)*` and the encoded part
/// is lowercase hex. The encoded length is not checked against the
/// algorithm.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest {
    algorithm: String,
    encoded: String,
}

impl Digest {
    /// Creates a digest from its two halves.
    pub fn new(algorithm: &str, encoded: &str) -> Result<Self, ReferenceError> {
        let input = format!("{algorithm}:{encoded}");
        validate(algorithm, encoded).map_err(|reason| ReferenceError::invalid(&input, reason))?;
        Ok(Self {
            algorithm: algorithm.to_string(),
            encoded: encoded.to_string(),
        })
    }

    /// Parses a digest from `algorithm:encoded`.
    pub fn parse(s: &str) -> Result<Self, ReferenceError> {
        let (algorithm, encoded) = split(s).map_err(|reason| ReferenceError::invalid(s, reason))?;
        Ok(Self {
            algorithm: algorithm.to_string(),
            encoded: encoded.to_string(),
        })
    }

    /// Builds the sha256 digest for an already hex-encoded hash.
    pub fn sha256(encoded: &str) -> Result<Self, ReferenceError> {
        Self::new(SHA256, encoded)
    }

    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    #[must_use]
    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

/// Splits and validates `algorithm:encoded`, returning the reason on failure.
pub(crate) fn split(s: &str) -> Result<(&str, &str), String> {
    let Some((algorithm, encoded)) = s.split_once(':') else {
        return Err(format!("digest {s:?} is missing the algorithm separator"));
    };
    validate(algorithm, encoded)?;
    Ok((algorithm, encoded))
}

fn validate(algorithm: &str, encoded: &str) -> Result<(), String> {
    let algorithm_ok = !algorithm.is_empty()
        && algorithm
            .split(['+', '.', '_', '-'])
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    if !algorithm_ok {
        return Err(format!("invalid digest algorithm {algorithm:?}"));
    }

    let encoded_ok = !encoded.is_empty()
        && encoded
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if !encoded_ok {
        return Err(format!("invalid digest hash {encoded:?}"));
    }

    Ok(())
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.encoded)
    }
}

impl FromStr for Digest {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
