//! Bundle documents.
//!
//! The store treats a bundle as an opaque JSON object. It only reads the
//! few well-known fields the CLI reports on; everything else is carried
//! through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A bundle metadata document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleDocument(Map<String, Value>);

/// An image referenced by a bundle, keyed by service name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleImage<'a> {
    pub service: &'a str,
    pub image: &'a str,
}

impl BundleDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from JSON bytes.
    ///
    /// Any JSON object is a valid document.
    pub fn from_slice(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Serialize the document as pretty-printed JSON.
    pub fn to_vec_pretty(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(&self.0)
    }

    /// Bundle name, if present.
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// Bundle version, if present.
    pub fn version(&self) -> Option<&str> {
        self.0.get("version").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.0.get("description").and_then(Value::as_str)
    }

    /// Images the bundle refers to (`images.<service>.image`), sorted by
    /// service name.
    pub fn images(&self) -> Vec<BundleImage<'_>> {
        let Some(images) = self.0.get("images").and_then(Value::as_object) else {
            return Vec::new();
        };

        images
            .iter()
            .filter_map(|(service, entry)| {
                let image = entry.get("image").and_then(Value::as_str)?;
                Some(BundleImage { service, image })
            })
            .collect()
    }

    /// Get a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a top-level field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for BundleDocument {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_well_known_fields() {
        let doc: BundleDocument = serde_json::from_value(json!({
            "name": "myapp",
            "version": "0.1.0",
            "description": "demo",
            "images": {
                "web": { "image": "nginx:1.25" },
                "db": { "image": "postgres:16", "description": "database" },
                "broken": { "description": "no image" }
            }
        }))
        .unwrap();

        assert_eq!(doc.name(), Some("myapp"));
        assert_eq!(doc.version(), Some("0.1.0"));
        assert_eq!(doc.description(), Some("demo"));
        assert_eq!(
            doc.images(),
            vec![
                BundleImage { service: "db", image: "postgres:16" },
                BundleImage { service: "web", image: "nginx:1.25" },
            ]
        );
    }

    #[test]
    fn test_unknown_fields_are_preserved() {
        let input = json!({
            "name": 42,
            "actions": { "io.cnab.status": { "modifies": false } },
            "schemaVersion": "v1.0.0"
        });
        let doc: BundleDocument = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(doc.name(), None);

        let bytes = doc.to_vec_pretty().unwrap();
        let reparsed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(reparsed, input);
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(BundleDocument::from_slice(b"[1, 2]").is_err());
        assert!(BundleDocument::from_slice(b"\"name\"").is_err());
        assert!(BundleDocument::from_slice(b"{ not json").is_err());
    }

    #[test]
    fn test_insert_and_get() {
        let mut doc = BundleDocument::new();
        assert!(doc.insert("name", json!("b")).is_none());
        assert_eq!(doc.get("name"), Some(&json!("b")));
        assert_eq!(doc.into_map().len(), 1);
    }
}
