use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Document;

/// Append-only audit record. Exactly one per mutating step on a document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LogRecord {
    pub id: String,
    /// Document the record concerns.
    pub docid: String,
    /// Free-text description, e.g. `"modified status, amount"`.
    pub action: String,
    /// Name of the acting account.
    pub account: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Snapshot of the document before the mutation; `None` on creation.
    #[serde(default)]
    pub initial: Option<Document>,
}

/// Fixed action texts written to the log.
pub mod actions {
    pub const CREATED: &str = "created";
    pub const DEFINED: &str = "defined";
    pub const ADDED_SAMPLES: &str = "added samples";
    pub const UPLOADED_ATTACHMENT: &str = "uploaded attachment";
    pub const DELETED_ATTACHMENT: &str = "deleted attachment";
    pub const REMOVED_TAGS: &str = "removed tags";
    pub const ADDED_TAGS: &str = "added tags";
    pub const REMOVED_XREFS: &str = "removed xrefs";
    pub const ADDED_XREF: &str = "added xref";
    pub const LOCKED: &str = "locked";
    pub const UNLOCKED: &str = "unlocked";

    /// Action text for a batch of field modifications.
    #[must_use]
    pub fn modified(fields: &[&str]) -> String {
        format!("modified {}", fields.join(", "))
    }
}
