//! `DocumentStore` implementation over libSQL.
//!
//! Every write goes through [`write_document`], which enforces the revision
//! check with a conditional `UPDATE` and maps the unique name index onto
//! `StoreError::NameTaken`. Attachment writes bump the document revision in
//! the same transaction as the blob, and the `*_logged` writes insert their
//! log record in that transaction too.

use std::fmt::Display;

use chrono::SecondsFormat;
use lims_core::entities::{AttachmentStub, Document, LogRecord};
use lims_core::enums::EntityKind;
use lims_core::store::{Attachment, DocumentStore, IndexKey, IndexRow, StoreError};
use lims_schema::schema_for;

use crate::LimsDb;
use crate::helpers::{parse_json, to_json};

fn backend(error: impl Display) -> StoreError {
    StoreError::Backend(error.to_string())
}

/// Generation number of a revision token `"<n>-<hex>"`.
fn generation(revision: Option<&str>) -> u64 {
    revision
        .and_then(|rev| rev.split_once('-'))
        .and_then(|(n, _)| n.parse().ok())
        .unwrap_or(0)
}

/// Current revision of a stored document.
async fn stored_revision(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Option<String>, StoreError> {
    let mut rows = conn
        .query("SELECT revision FROM documents WHERE id = ?1", [id])
        .await
        .map_err(backend)?;
    match rows.next().await.map_err(backend)? {
        Some(row) => Ok(Some(row.get::<String>(0).map_err(backend)?)),
        None => Ok(None),
    }
}

/// Insert or revision-checked update of one document.
async fn write_document(
    conn: &libsql::Connection,
    doc: &Document,
    revision: &str,
) -> Result<(), StoreError> {
    let mut body = doc.clone();
    body.revision = None;
    let body = to_json(&body).map_err(backend)?;
    let name = doc.name();
    let now = chrono::Utc::now().to_rfc3339();

    let result = match doc.revision.as_deref() {
        None => {
            conn.execute(
                "INSERT INTO documents (id, entity, name, revision, body, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                libsql::params![doc.id.as_str(), doc.entity.as_str(), name, revision, body, now],
            )
            .await
        }
        Some(expected) => {
            conn.execute(
                "UPDATE documents SET name = ?2, revision = ?3, body = ?4, updated_at = ?5
                 WHERE id = ?1 AND revision = ?6",
                libsql::params![doc.id.as_str(), name, revision, body, now, expected],
            )
            .await
        }
    };

    let affected = match result {
        Ok(affected) => affected,
        Err(e) => {
            let message = e.to_string();
            if message.contains("UNIQUE constraint failed: documents.entity, documents.name") {
                return Err(StoreError::NameTaken {
                    entity: doc.entity.to_string(),
                    name: name.unwrap_or_default().to_string(),
                });
            }
            if message.contains("UNIQUE constraint failed: documents.id") {
                return Err(StoreError::RevisionConflict {
                    id: doc.id.clone(),
                    expected: String::new(),
                    actual: stored_revision(conn, &doc.id).await?,
                });
            }
            return Err(backend(message));
        }
    };

    if affected == 0 {
        let actual = stored_revision(conn, &doc.id).await?;
        if actual.is_none() {
            return Err(StoreError::NotFound { id: doc.id.clone() });
        }
        return Err(StoreError::RevisionConflict {
            id: doc.id.clone(),
            expected: doc.revision_str().to_string(),
            actual,
        });
    }
    Ok(())
}

/// Blob change committed together with a document write.
enum BlobChange<'a> {
    None,
    Put {
        filename: &'a str,
        content_type: &'a str,
        content: &'a [u8],
    },
    Delete {
        filename: &'a str,
    },
}

async fn apply_blob_change(
    conn: &libsql::Connection,
    docid: &str,
    change: BlobChange<'_>,
) -> Result<(), StoreError> {
    match change {
        BlobChange::None => {}
        BlobChange::Put {
            filename,
            content_type,
            content,
        } => {
            conn.execute(
                "INSERT OR REPLACE INTO attachments (docid, filename, content_type, content)
                 VALUES (?1, ?2, ?3, ?4)",
                libsql::params![
                    docid,
                    filename,
                    content_type,
                    libsql::Value::Blob(content.to_vec())
                ],
            )
            .await
            .map_err(backend)?;
        }
        BlobChange::Delete { filename } => {
            conn.execute(
                "DELETE FROM attachments WHERE docid = ?1 AND filename = ?2",
                libsql::params![docid, filename],
            )
            .await
            .map_err(backend)?;
        }
    }
    Ok(())
}

/// Append one log record.
pub(crate) async fn insert_log(
    conn: &libsql::Connection,
    record: &LogRecord,
) -> Result<(), StoreError> {
    let initial = record.initial.as_ref().map(to_json).transpose().map_err(backend)?;
    conn.execute(
        "INSERT INTO log_records (id, docid, action, account, comment, initial, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        libsql::params![
            record.id.as_str(),
            record.docid.as_str(),
            record.action.as_str(),
            record.account.as_str(),
            record.comment.as_deref(),
            initial,
            record
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Micros, true)
        ],
    )
    .await
    .map_err(backend)?;
    Ok(())
}

/// Document with `filename` added to its attachment stubs.
fn with_stub(doc: &Document, filename: &str, content_type: &str, length: usize) -> Document {
    let mut next = doc.clone();
    next.attachments.insert(
        filename.to_string(),
        AttachmentStub {
            content_type: content_type.to_string(),
            length: length as u64,
        },
    );
    next
}

/// Document with `filename` removed from its attachment stubs.
fn without_stub(doc: &Document, filename: &str) -> Result<Document, StoreError> {
    if !doc.attachments.contains_key(filename) {
        return Err(StoreError::NotFound {
            id: format!("{}/{filename}", doc.id),
        });
    }
    let mut next = doc.clone();
    next.attachments.remove(filename);
    Ok(next)
}

impl LimsDb {
    async fn next_revision(&self, current: Option<&str>) -> Result<String, StoreError> {
        let suffix = self.random_hex(4).await.map_err(backend)?;
        Ok(format!("{}-{suffix}", generation(current) + 1))
    }

    /// Write `doc`, its blob change and its log record in one transaction.
    async fn write(
        &self,
        doc: &Document,
        change: BlobChange<'_>,
        log: Option<&LogRecord>,
    ) -> Result<String, StoreError> {
        let revision = self.next_revision(doc.revision.as_deref()).await?;
        let tx = self.conn.transaction().await.map_err(backend)?;
        let mut outcome = write_document(&tx, doc, &revision).await;
        if outcome.is_ok() {
            outcome = apply_blob_change(&tx, &doc.id, change).await;
        }
        if let Some(record) = log
            && outcome.is_ok()
        {
            outcome = insert_log(&tx, record).await;
        }
        match outcome {
            Ok(()) => {
                tx.commit().await.map_err(backend)?;
                Ok(revision)
            }
            Err(e) => {
                tx.rollback().await.map_err(backend)?;
                Err(e)
            }
        }
    }

    /// [`DocumentStore::save`] together with the record logging it. Either
    /// both are committed or neither is.
    ///
    /// # Errors
    ///
    /// As for `save`, plus `Backend` when the log insert fails.
    pub async fn save_logged(&self, doc: &Document, record: &LogRecord) -> Result<String, StoreError> {
        self.write(doc, BlobChange::None, Some(record)).await
    }

    /// [`DocumentStore::put_attachment`] together with its log record.
    ///
    /// # Errors
    ///
    /// As for `put_attachment`, plus `Backend` when the log insert fails.
    pub async fn put_attachment_logged(
        &self,
        doc: &Document,
        filename: &str,
        content_type: &str,
        content: &[u8],
        record: &LogRecord,
    ) -> Result<String, StoreError> {
        let next = with_stub(doc, filename, content_type, content.len());
        let change = BlobChange::Put {
            filename,
            content_type,
            content,
        };
        self.write(&next, change, Some(record)).await
    }

    /// [`DocumentStore::delete_attachment`] together with its log record.
    ///
    /// # Errors
    ///
    /// As for `delete_attachment`, plus `Backend` when the log insert fails.
    pub async fn delete_attachment_logged(
        &self,
        doc: &Document,
        filename: &str,
        record: &LogRecord,
    ) -> Result<String, StoreError> {
        let next = without_stub(doc, filename)?;
        self.write(&next, BlobChange::Delete { filename }, Some(record))
            .await
    }
}

impl DocumentStore for LimsDb {
    async fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let mut rows = self
            .conn
            .query("SELECT body, revision FROM documents WHERE id = ?1", [id])
            .await
            .map_err(backend)?;
        let Some(row) = rows.next().await.map_err(backend)? else {
            return Ok(None);
        };
        let mut doc: Document = parse_json(&row.get::<String>(0).map_err(backend)?).map_err(backend)?;
        doc.revision = Some(row.get::<String>(1).map_err(backend)?);
        Ok(Some(doc))
    }

    async fn find_by_index(
        &self,
        entity: EntityKind,
        index: &str,
        key: &IndexKey,
    ) -> Result<Vec<IndexRow>, StoreError> {
        let spec = schema_for(entity)
            .index(index)
            .ok_or_else(|| backend(format!("{entity} has no index '{index}'")))?;

        let mut params: Vec<libsql::Value> = vec![
            entity.as_str().into(),
            format!("$.{}", spec.field).into(),
        ];
        let condition = match key {
            IndexKey::Exact(value) => {
                params.push(value.as_str().into());
                "AND CAST(j.value AS TEXT) = ?3"
            }
            IndexKey::Prefix(prefix) => {
                params.push(prefix.as_str().into());
                "AND substr(CAST(j.value AS TEXT), 1, length(?3)) = ?3"
            }
            IndexKey::All => "",
        };
        let sql = format!(
            "SELECT CAST(j.value AS TEXT), d.id, coalesce(d.name, '')
             FROM documents d, json_each(d.body, ?2) j
             WHERE d.entity = ?1 AND j.type != 'null' {condition}
             ORDER BY 1, 3"
        );

        let mut rows = self
            .conn
            .query(&sql, libsql::params_from_iter(params))
            .await
            .map_err(backend)?;
        let mut hits = Vec::new();
        while let Some(row) = rows.next().await.map_err(backend)? {
            hits.push(IndexRow {
                key: row.get::<String>(0).map_err(backend)?,
                id: row.get::<String>(1).map_err(backend)?,
                name: row.get::<String>(2).map_err(backend)?,
            });
        }
        Ok(hits)
    }

    async fn save(&self, doc: &Document) -> Result<String, StoreError> {
        self.write(doc, BlobChange::None, None).await
    }

    async fn put_attachment(
        &self,
        doc: &Document,
        filename: &str,
        content_type: &str,
        content: &[u8],
    ) -> Result<String, StoreError> {
        let next = with_stub(doc, filename, content_type, content.len());
        self.write(
            &next,
            BlobChange::Put {
                filename,
                content_type,
                content,
            },
            None,
        )
        .await
    }

    async fn delete_attachment(
        &self,
        doc: &Document,
        filename: &str,
    ) -> Result<String, StoreError> {
        let next = without_stub(doc, filename)?;
        self.write(&next, BlobChange::Delete { filename }, None).await
    }

    async fn get_attachment(
        &self,
        id: &str,
        filename: &str,
    ) -> Result<Option<Attachment>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT content_type, content FROM attachments WHERE docid = ?1 AND filename = ?2",
                libsql::params![id, filename],
            )
            .await
            .map_err(backend)?;
        let Some(row) = rows.next().await.map_err(backend)? else {
            return Ok(None);
        };
        Ok(Some(Attachment {
            filename: filename.to_string(),
            content_type: row.get::<String>(0).map_err(backend)?,
            content: row.get::<Vec<u8>>(1).map_err(backend)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn log_record(id: &str, docid: &str) -> LogRecord {
        LogRecord {
            id: id.to_string(),
            docid: docid.to_string(),
            action: "created".to_string(),
            account: "root".to_string(),
            timestamp: Utc::now(),
            comment: None,
            initial: None,
        }
    }

    async fn log_count(db: &LimsDb) -> i64 {
        let mut rows = db
            .conn()
            .query("SELECT count(*) FROM log_records", ())
            .await
            .unwrap();
        rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap()
    }

    async fn test_db() -> LimsDb {
        LimsDb::open_local(":memory:").await.unwrap()
    }

    fn sample(id: &str, name: &str, project: &str) -> Document {
        let mut doc = Document::new(id, EntityKind::Sample, Utc::now());
        doc.set("name", json!(name));
        doc.set("project", json!(project));
        doc
    }

    #[tokio::test]
    async fn save_and_get_roundtrip() {
        let db = test_db().await;
        let mut doc = sample("smp-1", "s1", "P1");
        doc.tags = vec!["frozen".into()];

        let revision = db.save(&doc).await.unwrap();
        assert!(revision.starts_with("1-"));

        let fetched = db.get("smp-1").await.unwrap().unwrap();
        assert_eq!(fetched.revision.as_deref(), Some(revision.as_str()));
        assert_eq!(fetched.get_str("project"), Some("P1"));
        assert_eq!(fetched.tags, vec!["frozen".to_string()]);
        assert!(db.get("smp-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stale_revision_is_rejected() {
        let db = test_db().await;
        let mut doc = sample("smp-1", "s1", "P1");
        doc.revision = Some(db.save(&doc).await.unwrap());

        let stale = doc.clone();
        doc.set("amount", json!(2.0));
        let second = db.save(&doc).await.unwrap();
        assert!(second.starts_with("2-"));

        let result = db.save(&stale).await;
        assert!(matches!(result, Err(StoreError::RevisionConflict { .. })));
        let stored = db.get("smp-1").await.unwrap().unwrap();
        assert_eq!(stored.get("amount"), Some(&json!(2.0)));
    }

    #[tokio::test]
    async fn duplicate_name_is_taken() {
        let db = test_db().await;
        db.save(&sample("smp-1", "s1", "P1")).await.unwrap();
        let result = db.save(&sample("smp-2", "s1", "P1")).await;
        assert!(matches!(result, Err(StoreError::NameTaken { .. })));

        // Same name under another kind is fine.
        let mut project = Document::new("prj-1", EntityKind::Project, Utc::now());
        project.set("name", json!("s1"));
        db.save(&project).await.unwrap();
    }

    #[tokio::test]
    async fn index_queries_by_key() {
        let db = test_db().await;
        db.save(&sample("smp-1", "s1", "P1")).await.unwrap();
        db.save(&sample("smp-2", "s2", "P2")).await.unwrap();
        db.save(&sample("smp-3", "t3", "P1")).await.unwrap();

        let rows = db
            .find_by_index(EntityKind::Sample, "project", &IndexKey::Exact("P1".into()))
            .await
            .unwrap();
        let names: Vec<_> = rows.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(names, vec!["s1", "t3"]);

        let rows = db
            .find_by_index(EntityKind::Sample, "name", &IndexKey::Prefix("s".into()))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);

        let rows = db
            .find_by_index(EntityKind::Sample, "name", &IndexKey::All)
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn array_fields_index_every_member() {
        let db = test_db().await;
        let mut workset = Document::new("wks-1", EntityKind::Workset, Utc::now());
        workset.set("name", json!("w1"));
        workset.set("samples", json!(["s1", "s2"]));
        workset.tags = vec!["urgent".into()];
        db.save(&workset).await.unwrap();

        for sample in ["s1", "s2"] {
            let rows = db
                .find_by_index(EntityKind::Workset, "sample", &IndexKey::Exact(sample.into()))
                .await
                .unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].name, "w1");
        }
        let rows = db
            .find_by_index(EntityKind::Workset, "tag", &IndexKey::Exact("urgent".into()))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn unknown_index_is_an_error() {
        let db = test_db().await;
        let result = db
            .find_by_index(EntityKind::Application, "operator", &IndexKey::All)
            .await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn attachment_put_get_delete() {
        let db = test_db().await;
        let mut doc = sample("smp-1", "s1", "P1");
        doc.revision = Some(db.save(&doc).await.unwrap());

        let revision = db
            .put_attachment(&doc, "gel.txt", "text/plain", b"bands")
            .await
            .unwrap();
        assert!(revision.starts_with("2-"));
        let doc = db.get("smp-1").await.unwrap().unwrap();
        assert_eq!(doc.attachments["gel.txt"].length, 5);

        let attachment = db.get_attachment("smp-1", "gel.txt").await.unwrap().unwrap();
        assert_eq!(attachment.content, b"bands".to_vec());
        assert_eq!(attachment.content_type, "text/plain");

        db.delete_attachment(&doc, "gel.txt").await.unwrap();
        let doc = db.get("smp-1").await.unwrap().unwrap();
        assert!(doc.attachments.is_empty());
        assert!(db.get_attachment("smp-1", "gel.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn attachment_on_stale_revision_writes_nothing() {
        let db = test_db().await;
        let mut doc = sample("smp-1", "s1", "P1");
        doc.revision = Some(db.save(&doc).await.unwrap());
        db.save(&doc).await.unwrap();

        let result = db.put_attachment(&doc, "gel.txt", "text/plain", b"x").await;
        assert!(matches!(result, Err(StoreError::RevisionConflict { .. })));
        assert!(db.get_attachment("smp-1", "gel.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn logged_save_commits_document_and_record() {
        let db = test_db().await;
        let doc = sample("smp-1", "s1", "P1");
        let revision = db.save_logged(&doc, &log_record("log-1", "smp-1")).await.unwrap();

        let stored = db.get("smp-1").await.unwrap().unwrap();
        assert_eq!(stored.revision.as_deref(), Some(revision.as_str()));
        assert_eq!(log_count(&db).await, 1);
    }

    #[tokio::test]
    async fn failing_log_insert_rolls_back_the_write() {
        let db = test_db().await;
        insert_log(db.conn(), &log_record("log-1", "smp-0")).await.unwrap();

        let doc = sample("smp-1", "s1", "P1");
        let result = db.save_logged(&doc, &log_record("log-1", "smp-1")).await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert!(db.get("smp-1").await.unwrap().is_none());
        assert_eq!(log_count(&db).await, 1);
    }

    #[tokio::test]
    async fn failing_log_insert_keeps_the_attachment_out() {
        let db = test_db().await;
        let mut doc = sample("smp-1", "s1", "P1");
        doc.revision = Some(db.save_logged(&doc, &log_record("log-1", "smp-1")).await.unwrap());

        let result = db
            .put_attachment_logged(&doc, "gel.txt", "text/plain", b"x", &log_record("log-1", "smp-1"))
            .await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
        let stored = db.get("smp-1").await.unwrap().unwrap();
        assert_eq!(stored.revision, doc.revision);
        assert!(stored.attachments.is_empty());
        assert!(db.get_attachment("smp-1", "gel.txt").await.unwrap().is_none());
    }
}
