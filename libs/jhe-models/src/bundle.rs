//! FHIR Bundle model
//!
//! A page of search results from the Exchange's FHIR API. Entries are kept as
//! raw JSON: the server sometimes wraps each record in a single-member
//! container (`{"resource": {...}}`) and sometimes returns it bare.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Link relation that points at the following page.
pub const NEXT_RELATION: &str = "next";

/// FHIR Bundle resource
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    /// Resource type - always "Bundle"
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    /// Logical id of this artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Indicates the purpose of this bundle
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub bundle_type: Option<BundleType>,

    /// If search, the total number of matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,

    /// Links related to this Bundle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Vec<BundleLink>>,

    /// Entries, raw or wrapped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<Vec<Value>>,

    /// Additional content beyond core fields
    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

fn default_resource_type() -> String {
    "Bundle".to_string()
}

/// Type of Bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleType {
    Document,
    Message,
    Transaction,
    TransactionResponse,
    Batch,
    BatchResponse,
    History,
    /// Search Results Bundle - Results of a search operation
    Searchset,
    Collection,
}

/// Links related to this Bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleLink {
    /// See http://www.iana.org/assignments/link-relations/link-relations.xhtml#link-relations-1
    pub relation: String,

    /// Reference details for the link
    pub url: String,
}

impl Bundle {
    /// Create a new Bundle with minimal required fields
    pub fn new(bundle_type: BundleType) -> Self {
        Self {
            resource_type: default_resource_type(),
            bundle_type: Some(bundle_type),
            ..Default::default()
        }
    }

    /// Check if this is a search result bundle
    pub fn is_searchset(&self) -> bool {
        matches!(self.bundle_type, Some(BundleType::Searchset))
    }

    /// Get the number of entries in the bundle
    pub fn entry_count(&self) -> usize {
        self.entry.as_ref().map(|e| e.len()).unwrap_or(0)
    }

    /// Get links as a slice
    pub fn links(&self) -> &[BundleLink] {
        self.link.as_deref().unwrap_or(&[])
    }

    /// URL of the following page.
    ///
    /// When several `next` links are present the last one wins.
    pub fn next_link(&self) -> Option<&str> {
        self.links()
            .iter()
            .rev()
            .find(|link| link.relation == NEXT_RELATION)
            .map(|link| link.url.as_str())
    }

    /// Add an entry to the bundle
    pub fn add_entry(&mut self, entry: Value) {
        self.entry.get_or_insert_with(Vec::new).push(entry);
    }

    /// Add a link to the bundle
    pub fn add_link(&mut self, relation: impl Into<String>, url: impl Into<String>) {
        self.link.get_or_insert_with(Vec::new).push(BundleLink {
            relation: relation.into(),
            url: url.into(),
        });
    }
}

/// Strip one level of single-member wrapping from a bundle entry.
///
/// `{"resource": {...}}` becomes the inner object. Anything else, including a
/// bare record that happens to have a single member which is not an object, is
/// returned unchanged.
pub fn unwrap_entry(entry: Value) -> Value {
    match entry {
        Value::Object(map) if map.len() == 1 && map.values().all(Value::is_object) => map
            .into_iter()
            .next()
            .map(|(_, inner)| inner)
            .unwrap_or(Value::Null),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_bundle() {
        let json = json!({
            "resourceType": "Bundle",
            "id": "example-bundle",
            "type": "searchset",
            "total": 1,
            "link": [{"relation": "self", "url": "http://example.org/fhir/r5/Observation"}],
            "entry": [
                {
                    "resource": {
                        "resourceType": "Observation",
                        "id": "123"
                    }
                }
            ]
        });

        let bundle: Bundle = serde_json::from_value(json).unwrap();
        assert_eq!(bundle.id, Some("example-bundle".to_string()));
        assert!(bundle.is_searchset());
        assert_eq!(bundle.total, Some(1));
        assert_eq!(bundle.entry_count(), 1);
        assert_eq!(bundle.next_link(), None);
    }

    #[test]
    fn test_deserialize_minimal_page() {
        let bundle: Bundle = serde_json::from_value(json!({"entry": []})).unwrap();
        assert_eq!(bundle.resource_type, "Bundle");
        assert_eq!(bundle.bundle_type, None);
        assert!(bundle.links().is_empty());
    }

    #[test]
    fn test_serialize_bundle() {
        let bundle = Bundle::new(BundleType::Searchset);
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["resourceType"], "Bundle");
        assert_eq!(json["type"], "searchset");
        assert!(json.get("entry").is_none());
    }

    #[test]
    fn test_next_link_last_wins() {
        let mut bundle = Bundle::new(BundleType::Searchset);
        bundle.add_link("self", "http://example.org/page1");
        bundle.add_link("next", "http://example.org/page2");
        bundle.add_link("next", "http://example.org/page3");
        assert_eq!(bundle.next_link(), Some("http://example.org/page3"));
    }

    #[test]
    fn test_add_entry() {
        let mut bundle = Bundle::new(BundleType::Collection);
        bundle.add_entry(json!({"resource": {"id": "1"}}));
        bundle.add_entry(json!({"id": "2"}));
        assert_eq!(bundle.entry_count(), 2);
    }

    #[test]
    fn test_unwrap_entry() {
        assert_eq!(
            unwrap_entry(json!({"resource": {"id": "1", "status": "final"}})),
            json!({"id": "1", "status": "final"})
        );
        // bare records pass through
        assert_eq!(
            unwrap_entry(json!({"id": "2", "status": "final"})),
            json!({"id": "2", "status": "final"})
        );
        // single member that is not an object is not a wrapper
        assert_eq!(unwrap_entry(json!({"id": "3"})), json!({"id": "3"}));
        // only one level is removed
        assert_eq!(
            unwrap_entry(json!({"a": {"b": {"id": "4"}}})),
            json!({"b": {"id": "4"}})
        );
    }
}
