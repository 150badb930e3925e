//! Document store adapter.
//!
//! The field framework and the entity orchestration talk to persistence only
//! through [`DocumentStore`]. Implementations guarantee single-document
//! atomicity and optimistic concurrency on the revision token; nothing else
//! about transactions or query cost is assumed.

use thiserror::Error;

use crate::entities::Document;
use crate::enums::EntityKind;

/// Errors raised by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {id}")]
    NotFound { id: String },

    /// The supplied revision is not the stored one.
    #[error("Revision conflict on {id}: supplied {expected}")]
    RevisionConflict {
        id: String,
        expected: String,
        actual: Option<String>,
    },

    /// The store-level unique name constraint rejected the write.
    #[error("{entity} name '{name}' is already taken")]
    NameTaken { entity: String, name: String },

    #[error("Store backend failure: {0}")]
    Backend(String),
}

/// Key selection for an index query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexKey {
    Exact(String),
    Prefix(String),
    All,
}

/// One hit of an index query: the indexed key and the document it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub key: String,
    pub id: String,
    pub name: String,
}

/// Attachment content as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Fetch a document by ID.
    async fn get(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// Query a secondary index of an entity kind. Rows are ordered by key,
    /// then by document name.
    async fn find_by_index(
        &self,
        entity: EntityKind,
        index: &str,
        key: &IndexKey,
    ) -> Result<Vec<IndexRow>, StoreError>;

    /// Persist a document and return its new revision.
    ///
    /// A document without a revision is inserted; otherwise its revision must
    /// match the stored one or the save fails with `RevisionConflict`.
    async fn save(&self, doc: &Document) -> Result<String, StoreError>;

    /// Add or replace an attachment, returning the document's new revision.
    async fn put_attachment(
        &self,
        doc: &Document,
        filename: &str,
        content_type: &str,
        content: &[u8],
    ) -> Result<String, StoreError>;

    /// Remove an attachment, returning the document's new revision.
    async fn delete_attachment(&self, doc: &Document, filename: &str)
    -> Result<String, StoreError>;

    async fn get_attachment(
        &self,
        id: &str,
        filename: &str,
    ) -> Result<Option<Attachment>, StoreError>;

    /// Fetch the document of a kind holding the given name, if any.
    async fn get_named(
        &self,
        entity: EntityKind,
        name: &str,
    ) -> Result<Option<Document>, StoreError> {
        let rows = self
            .find_by_index(entity, "name", &IndexKey::Exact(name.to_string()))
            .await?;
        match rows.first() {
            Some(row) => self.get(&row.id).await,
            None => Ok(None),
        }
    }

    /// Whether a document of the kind holds the given name.
    async fn name_exists(&self, entity: EntityKind, name: &str) -> Result<bool, StoreError> {
        let rows = self
            .find_by_index(entity, "name", &IndexKey::Exact(name.to_string()))
            .await?;
        Ok(!rows.is_empty())
    }
}
