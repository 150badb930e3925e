//! Attachment repository: upload decoding, the update sub-steps and the
//! standalone get/put/delete operations.

use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lims_core::entities::{Document, LogRecord, actions};
use lims_core::enums::EntityKind;
use lims_core::errors::CoreError;
use lims_core::identity::Actor;
use lims_core::store::{Attachment, DocumentStore};
use lims_schema::policy::edit_forbidden;
use lims_schema::schema_for;
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;
use crate::repos::log::logged;
use crate::service::LimsService;

/// How upload content arrived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferEncoding {
    #[default]
    Binary,
    Base64,
    QuotedPrintable,
}

impl TransferEncoding {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Base64 => "base64",
            Self::QuotedPrintable => "quoted-printable",
        }
    }

    /// Decode transferred bytes.
    ///
    /// # Errors
    ///
    /// `InvalidValue` on the `attachment` field for malformed input.
    pub fn decode(self, data: &[u8]) -> Result<Vec<u8>, CoreError> {
        match self {
            Self::Binary => Ok(data.to_vec()),
            Self::Base64 => {
                let compact: Vec<u8> = data
                    .iter()
                    .copied()
                    .filter(|byte| !byte.is_ascii_whitespace())
                    .collect();
                STANDARD
                    .decode(compact)
                    .map_err(|e| CoreError::invalid("attachment", format!("malformed base64 data: {e}")))
            }
            Self::QuotedPrintable => decode_quoted_printable(data),
        }
    }
}

impl FromStr for TransferEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "8bit" | "7bit" => Ok(Self::Binary),
            "base64" => Ok(Self::Base64),
            "quoted-printable" => Ok(Self::QuotedPrintable),
            other => Err(format!("unknown transfer encoding '{other}'")),
        }
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

/// `=XX` escapes become bytes; `=` at a line end is a soft break.
fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>, CoreError> {
    let malformed = || CoreError::invalid("attachment", "malformed quoted-printable data");
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i] != b'=' {
            out.push(data[i]);
            i += 1;
            continue;
        }
        match data.get(i + 1..i + 3) {
            Some(b"\r\n") => i += 3,
            Some([b'\n', ..]) => i += 2,
            Some(&[high, low]) => {
                let byte = hex_value(high)
                    .zip(hex_value(low))
                    .map(|(high, low)| high << 4 | low)
                    .ok_or_else(malformed)?;
                out.push(byte);
                i += 3;
            }
            _ if data.get(i + 1) == Some(&b'\n') => i += 2,
            _ => return Err(malformed()),
        }
    }
    Ok(out)
}

/// An attachment as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
    pub encoding: TransferEncoding,
}

impl Upload {
    #[must_use]
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content,
            encoding: TransferEncoding::Binary,
        }
    }

    #[must_use]
    pub const fn encoded(mut self, encoding: TransferEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Check the filename and decode the content.
    ///
    /// # Errors
    ///
    /// `InvalidValue` for a blank or path-like filename or undecodable content.
    pub fn decode(&self) -> Result<Vec<u8>, CoreError> {
        let filename = self.filename.trim();
        if filename.is_empty() || filename.contains('/') {
            return Err(CoreError::invalid(
                "filename",
                format!("'{}' is not a valid attachment filename", self.filename),
            ));
        }
        self.encoding.decode(&self.content)
    }
}

/// Log comment of an attachment step.
fn attachment_comment(filename: &str, comment: Option<&str>) -> String {
    match comment {
        Some(comment) => format!("filename {filename}; {comment}"),
        None => format!("filename {filename}"),
    }
}

impl LimsService {
    /// Store an attachment on `doc` together with its log record; `doc`
    /// becomes the new revision.
    pub(crate) async fn upload_step(
        &self,
        actor: &Actor,
        doc: &mut Document,
        upload: &Upload,
        content: &[u8],
        comment: Option<&str>,
    ) -> Result<LogRecord, DatabaseError> {
        let filename = upload.filename.trim();
        let record = self
            .new_log_record(
                doc,
                actor,
                actions::UPLOADED_ATTACHMENT,
                Some(attachment_comment(filename, comment)),
                Some(doc.clone()),
            )
            .await?;
        self.db()
            .put_attachment_logged(doc, filename, &upload.content_type, content, &record)
            .await?;
        *doc = self.require_id(&doc.id).await?;
        logged(doc, &record);
        Ok(record)
    }

    /// Remove an attachment from `doc` together with its log record.
    pub(crate) async fn delete_attachment_step(
        &self,
        actor: &Actor,
        doc: &mut Document,
        filename: &str,
        comment: Option<&str>,
    ) -> Result<LogRecord, DatabaseError> {
        let record = self
            .new_log_record(
                doc,
                actor,
                actions::DELETED_ATTACHMENT,
                Some(attachment_comment(filename, comment)),
                Some(doc.clone()),
            )
            .await?;
        self.db()
            .delete_attachment_logged(doc, filename, &record)
            .await?;
        *doc = self.require_id(&doc.id).await?;
        logged(doc, &record);
        Ok(record)
    }

    /// Staff only, and never on a locked document.
    pub(crate) fn check_attachment_edit(actor: &Actor, doc: &Document) -> Result<(), CoreError> {
        if actor.is_staff() && !doc.is_locked() {
            Ok(())
        } else {
            Err(edit_forbidden(actor, format!("attachments of {}", doc.label())))
        }
    }

    /// Fetch an attachment of a document the actor may view.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown document or filename, `ViewForbidden`.
    pub async fn attachment_get(
        &self,
        actor: &Actor,
        entity: EntityKind,
        name: &str,
        filename: &str,
    ) -> Result<Attachment, DatabaseError> {
        let doc = self.require_named(entity, name).await?;
        schema_for(entity)
            .check_viewable(self.db(), actor, &doc)
            .await?;
        self.db()
            .get_attachment(&doc.id, filename)
            .await?
            .ok_or_else(|| CoreError::not_found("attachment", format!("{name}/{filename}")).into())
    }

    /// Add or replace an attachment.
    ///
    /// # Errors
    ///
    /// `EditForbidden` for non-staff actors or locked documents,
    /// `InvalidValue` for undecodable uploads, store failures.
    pub async fn attachment_put(
        &self,
        actor: &Actor,
        entity: EntityKind,
        name: &str,
        upload: &Upload,
        comment: Option<&str>,
    ) -> Result<(Document, LogRecord), DatabaseError> {
        let mut doc = self.require_named(entity, name).await?;
        schema_for(entity)
            .check_viewable(self.db(), actor, &doc)
            .await?;
        Self::check_attachment_edit(actor, &doc)?;
        let content = upload.decode()?;
        let record = self
            .upload_step(actor, &mut doc, upload, &content, comment)
            .await?;
        Ok((doc, record))
    }

    /// Remove an attachment.
    ///
    /// # Errors
    ///
    /// `EditForbidden` for non-staff actors or locked documents, `NotFound`
    /// for an unknown filename.
    pub async fn attachment_delete(
        &self,
        actor: &Actor,
        entity: EntityKind,
        name: &str,
        filename: &str,
        comment: Option<&str>,
    ) -> Result<(Document, LogRecord), DatabaseError> {
        let mut doc = self.require_named(entity, name).await?;
        schema_for(entity)
            .check_viewable(self.db(), actor, &doc)
            .await?;
        Self::check_attachment_edit(actor, &doc)?;
        if !doc.attachments.contains_key(filename) {
            return Err(CoreError::not_found("attachment", format!("{name}/{filename}")).into());
        }
        let record = self
            .delete_attachment_step(actor, &mut doc, filename, comment)
            .await?;
        Ok((doc, record))
    }
}
