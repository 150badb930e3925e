//! In-memory `DocumentStore` for unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{TimeZone, Utc};
use lims_core::entities::{AttachmentStub, Document};
use lims_core::enums::{EntityKind, Role};
use lims_core::identity::Actor;
use lims_core::ids::prefix_for;
use lims_core::store::{Attachment, DocumentStore, IndexKey, IndexRow, StoreError};
use serde_json::Value;

#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<String, Document>>,
    attachments: Mutex<BTreeMap<(String, String), Attachment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, doc: Document) {
        self.docs.lock().unwrap().insert(doc.id.clone(), doc);
    }

    fn bump(&self, doc: &Document) -> Result<String, StoreError> {
        let mut docs = self.docs.lock().unwrap();
        let stored = docs.get(&doc.id).and_then(|d| d.revision.clone());
        if doc.revision != stored {
            return Err(StoreError::RevisionConflict {
                id: doc.id.clone(),
                expected: doc.revision_str().to_string(),
                actual: stored,
            });
        }
        let generation = stored
            .and_then(|rev| rev.split('-').next().and_then(|n| n.parse::<u32>().ok()))
            .unwrap_or(0);
        let revision = format!("{}-test", generation + 1);
        let mut saved = doc.clone();
        saved.revision = Some(revision.clone());
        docs.insert(saved.id.clone(), saved);
        Ok(revision)
    }
}

/// A saved document of `entity` named `name` with extra fields.
pub fn stored(entity: EntityKind, name: &str, fields: Value) -> Document {
    let timestamp = Utc.with_ymd_and_hms(2011, 2, 10, 8, 0, 0).unwrap();
    let mut doc = Document::new(format!("{}-{name}", prefix_for(entity)), entity, timestamp);
    doc.revision = Some("1-test".into());
    doc.set("name", Value::String(name.into()));
    if let Value::Object(fields) = fields {
        doc.fields.extend(fields);
    }
    doc
}

pub fn actor() -> Actor {
    Actor::new("acc-root", "root", Role::Admin)
}

fn index_keys(doc: &Document, index: &str) -> Vec<String> {
    if index == "tag" {
        return doc.tags.clone();
    }
    match doc.get(index) {
        Some(Value::String(key)) => vec![key.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.docs.lock().unwrap().get(id).cloned())
    }

    async fn find_by_index(
        &self,
        entity: EntityKind,
        index: &str,
        key: &IndexKey,
    ) -> Result<Vec<IndexRow>, StoreError> {
        let docs = self.docs.lock().unwrap();
        let mut rows: Vec<IndexRow> = docs
            .values()
            .filter(|doc| doc.entity == entity)
            .flat_map(|doc| {
                index_keys(doc, index).into_iter().map(move |k| IndexRow {
                    key: k,
                    id: doc.id.clone(),
                    name: doc.name().unwrap_or_default().to_string(),
                })
            })
            .filter(|row| match key {
                IndexKey::Exact(wanted) => &row.key == wanted,
                IndexKey::Prefix(prefix) => row.key.starts_with(prefix.as_str()),
                IndexKey::All => true,
            })
            .collect();
        rows.sort_by(|a, b| (&a.key, &a.name).cmp(&(&b.key, &b.name)));
        Ok(rows)
    }

    async fn save(&self, doc: &Document) -> Result<String, StoreError> {
        self.bump(doc)
    }

    async fn put_attachment(
        &self,
        doc: &Document,
        filename: &str,
        content_type: &str,
        content: &[u8],
    ) -> Result<String, StoreError> {
        let mut updated = doc.clone();
        updated.attachments.insert(
            filename.to_string(),
            AttachmentStub {
                content_type: content_type.to_string(),
                length: content.len() as u64,
            },
        );
        let revision = self.bump(&updated)?;
        self.attachments.lock().unwrap().insert(
            (doc.id.clone(), filename.to_string()),
            Attachment {
                filename: filename.to_string(),
                content_type: content_type.to_string(),
                content: content.to_vec(),
            },
        );
        Ok(revision)
    }

    async fn delete_attachment(
        &self,
        doc: &Document,
        filename: &str,
    ) -> Result<String, StoreError> {
        let mut updated = doc.clone();
        updated.attachments.remove(filename);
        let revision = self.bump(&updated)?;
        self.attachments
            .lock()
            .unwrap()
            .remove(&(doc.id.clone(), filename.to_string()));
        Ok(revision)
    }

    async fn get_attachment(
        &self,
        id: &str,
        filename: &str,
    ) -> Result<Option<Attachment>, StoreError> {
        Ok(self
            .attachments
            .lock()
            .unwrap()
            .get(&(id.to_string(), filename.to_string()))
            .cloned())
    }
}
