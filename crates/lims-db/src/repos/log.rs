//! Log repository.
//!
//! Append-only records, one per committed mutation step, written in the
//! step's own transaction. The table rejects updates and deletes.

use chrono::Utc;
use lims_core::entities::{Document, LogRecord};
use lims_core::enums::EntityKind;
use lims_core::identity::Actor;
use lims_core::ids::PREFIX_LOG;
use lims_schema::schema_for;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_json};
use crate::service::LimsService;
use crate::store::insert_log;

pub(crate) fn logged(doc: &Document, record: &LogRecord) {
    tracing::info!(doc = %doc.label(), action = %record.action, account = %record.account, "logged");
}

fn row_to_log(row: &libsql::Row) -> Result<LogRecord, DatabaseError> {
    Ok(LogRecord {
        id: row.get::<String>(0)?,
        docid: row.get::<String>(1)?,
        action: row.get::<String>(2)?,
        account: row.get::<String>(3)?,
        comment: get_opt_string(row, 4)?,
        initial: get_opt_string(row, 5)?
            .map(|initial| parse_json(&initial))
            .transpose()?,
        timestamp: parse_datetime(&row.get::<String>(6)?)?,
    })
}

impl LimsService {
    /// Append a record that accompanies no document write.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the INSERT fails.
    pub async fn append_log(&self, record: &LogRecord) -> Result<(), DatabaseError> {
        insert_log(self.db().conn(), record).await?;
        Ok(())
    }

    /// The record of one mutation of `doc`, not yet stored.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if ID generation fails.
    pub async fn new_log_record(
        &self,
        doc: &Document,
        actor: &Actor,
        action: impl Into<String>,
        comment: Option<String>,
        initial: Option<Document>,
    ) -> Result<LogRecord, DatabaseError> {
        Ok(LogRecord {
            id: self.db().generate_id(PREFIX_LOG).await?,
            docid: doc.id.clone(),
            action: action.into(),
            account: actor.name.clone(),
            timestamp: Utc::now(),
            comment,
            initial,
        })
    }

    /// Build and append the record of a log-only event on `doc`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if ID generation or the INSERT fails.
    pub async fn log_change(
        &self,
        doc: &Document,
        actor: &Actor,
        action: impl Into<String>,
        comment: Option<String>,
        initial: Option<Document>,
    ) -> Result<LogRecord, DatabaseError> {
        let record = self
            .new_log_record(doc, actor, action, comment, initial)
            .await?;
        self.append_log(&record).await?;
        logged(doc, &record);
        Ok(record)
    }

    /// Log records of one document in timestamp order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn log_records(&self, docid: &str) -> Result<Vec<LogRecord>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, docid, action, account, comment, initial, timestamp
                 FROM log_records WHERE docid = ?1
                 ORDER BY timestamp, rowid",
                [docid],
            )
            .await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_log(&row)?);
        }
        Ok(records)
    }

    /// Log of a named document, for an actor allowed to view it.
    ///
    /// # Errors
    ///
    /// `NotFound`, `ViewForbidden`, or query failures.
    pub async fn log_for(
        &self,
        actor: &Actor,
        entity: EntityKind,
        name: &str,
    ) -> Result<Vec<LogRecord>, DatabaseError> {
        let doc = self.require_named(entity, name).await?;
        schema_for(entity)
            .check_viewable(self.db(), actor, &doc)
            .await?;
        self.log_records(&doc.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_service;
    use lims_core::entities::actions;
    use serde_json::json;

    fn doc() -> Document {
        let mut doc = Document::new("smp-1", EntityKind::Sample, Utc::now());
        doc.set("name", json!("s1"));
        doc
    }

    #[tokio::test]
    async fn records_keep_order_and_pre_image() {
        let svc = test_service().await;
        let actor = Actor::system();
        let doc = doc();

        svc.log_change(&doc, &actor, actions::CREATED, None, None)
            .await
            .unwrap();
        svc.log_change(
            &doc,
            &actor,
            actions::modified(&["amount"]),
            Some("weighed".into()),
            Some(doc.clone()),
        )
        .await
        .unwrap();

        let records = svc.log_records("smp-1").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].action, "created");
        assert!(records[0].initial.is_none());
        assert_eq!(records[1].action, "modified amount");
        assert_eq!(records[1].comment.as_deref(), Some("weighed"));
        assert_eq!(records[1].initial.as_ref().and_then(Document::name), Some("s1"));
        assert!(records.iter().all(|r| r.id.starts_with("log-")));
    }

    #[tokio::test]
    async fn other_documents_are_not_included() {
        let svc = test_service().await;
        svc.log_change(&doc(), &Actor::system(), actions::CREATED, None, None)
            .await
            .unwrap();
        assert!(svc.log_records("smp-2").await.unwrap().is_empty());
    }
}
