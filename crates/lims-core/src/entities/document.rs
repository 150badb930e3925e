use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::EntityKind;

/// Cross-reference to an external resource. Unique by `uri` within a document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Xref {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Metadata of a stored attachment; the content lives in the store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AttachmentStub {
    pub content_type: String,
    pub length: u64,
}

/// The unit of persistence.
///
/// Schema fields (including `name`) live in the flattened `fields` map so that
/// every entity kind shares one document type. A field holding JSON `null`
/// has been explicitly cleared; a missing key was never set.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    /// Opaque revision token; `None` until first saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    pub entity: EntityKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub xrefs: Vec<Xref>,
    #[serde(rename = "_attachments", default)]
    pub attachments: BTreeMap<String, AttachmentStub>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Document {
    /// A fresh, unsaved document.
    #[must_use]
    pub fn new(id: impl Into<String>, entity: EntityKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            revision: None,
            entity,
            timestamp,
            tags: Vec::new(),
            xrefs: Vec::new(),
            attachments: BTreeMap::new(),
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    /// Field value, treating JSON `null` as absent.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|value| !value.is_null())
    }

    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// String members of an array field; empty when unset.
    #[must_use]
    pub fn get_strings(&self, field: &str) -> Vec<String> {
        self.get(field)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self.fields.get("locked"), Some(Value::Bool(true)))
    }

    /// Human label used in error messages, e.g. `"sample s1"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.entity, self.name().unwrap_or(&self.id))
    }

    /// Revision token, or the empty string for an unsaved document.
    #[must_use]
    pub fn revision_str(&self) -> &str {
        self.revision.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_doc() -> Document {
        let ts = Utc.with_ymd_and_hms(2011, 2, 10, 8, 0, 0).unwrap();
        let mut doc = Document::new("smp-0011223344556677", EntityKind::Sample, ts);
        doc.set("name", json!("s1"));
        doc.set("altname", Value::Null);
        doc
    }

    #[test]
    fn fields_flatten_into_top_level() {
        let value = serde_json::to_value(sample_doc()).unwrap();
        assert_eq!(value["name"], "s1");
        assert_eq!(value["entity"], "sample");
        assert!(value["altname"].is_null());
        assert!(value.get("fields").is_none());
        assert!(value.get("revision").is_none());
        assert!(value["_attachments"].as_object().unwrap().is_empty());
    }

    #[test]
    fn null_counts_as_absent() {
        let doc = sample_doc();
        assert_eq!(doc.name(), Some("s1"));
        assert!(doc.get("altname").is_none());
        assert!(doc.fields.contains_key("altname"));
    }

    #[test]
    fn deserializes_unknown_keys_as_fields() {
        let doc: Document = serde_json::from_value(json!({
            "id": "prj-1",
            "revision": "3-abcd",
            "entity": "project",
            "timestamp": "2011-02-10T08:00:00Z",
            "name": "P1",
            "customer": "alice",
            "tags": ["x"],
            "xrefs": [{"uri": "http://a"}],
            "_attachments": {"f.txt": {"content_type": "text/plain", "length": 3}}
        }))
        .unwrap();
        assert_eq!(doc.revision.as_deref(), Some("3-abcd"));
        assert_eq!(doc.get_str("customer"), Some("alice"));
        assert_eq!(doc.tags, vec!["x".to_string()]);
        assert_eq!(doc.xrefs[0].title, None);
        assert_eq!(doc.attachments["f.txt"].length, 3);
        assert!(!doc.fields.contains_key("tags"));
    }

    #[test]
    fn locked_flag_and_label() {
        let mut doc = sample_doc();
        assert!(!doc.is_locked());
        doc.set("locked", json!(true));
        assert!(doc.is_locked());
        assert_eq!(doc.label(), "sample s1");
    }

    #[test]
    fn string_list_accessor() {
        let mut doc = sample_doc();
        assert!(doc.get_strings("samples").is_empty());
        doc.set("samples", json!(["a", "b"]));
        assert_eq!(doc.get_strings("samples"), vec!["a", "b"]);
    }
}
