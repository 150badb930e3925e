//! Entity repository: view, create, the multi-step update and listing.
//!
//! An update is validated completely before anything is written. It is then
//! committed as a sequence of steps, each its own revision written in one
//! transaction with its log record: field changes, attachment deletions, upload, tag removal, tag
//! addition, xref removal, xref addition, actions. A failing step leaves the
//! earlier ones in place.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use lims_core::entities::{Document, LogRecord, Xref, actions};
use lims_core::enums::EntityKind;
use lims_core::errors::CoreError;
use lims_core::identity::Actor;
use lims_core::ids::prefix_for;
use lims_core::store::{DocumentStore, IndexKey};
use lims_schema::entities::{ActionEffect, ActionSpec, EntitySchema};
use lims_schema::policy::edit_forbidden;
use lims_schema::render::FieldView;
use lims_schema::request::normalize;
use lims_schema::{FieldContext, FieldKind, Parsed, RequestValues, schema_for};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::DatabaseError;
use crate::repos::attachment::Upload;
use crate::repos::log::logged;
use crate::service::LimsService;

/// Named actions to run, multi-valued.
pub const ACTION_KEY: &str = "action";
/// Free text attached to the field-change and attachment log records.
pub const COMMENT_KEY: &str = "comment";
pub const ATTACHMENT_DELETE_KEY: &str = "_attachment_delete";
pub const TAG_REMOVE_KEY: &str = "_tag_remove";
/// Whitespace separated tags to add.
pub const TAGS_ADD_KEY: &str = "_tags_add";
pub const XREF_REMOVE_KEY: &str = "_xref_remove";
pub const XREF_ADD_URI_KEY: &str = "_xref_add_uri";
pub const XREF_ADD_TITLE_KEY: &str = "_xref_add_title";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentView {
    pub filename: String,
    pub content_type: String,
    pub length: u64,
    pub url: String,
}

/// Log line as shown with a document; the pre-image stays in the log table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub action: String,
    pub account: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Everything the actor may see of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityView {
    pub entity: EntityKind,
    pub id: String,
    pub name: Option<String>,
    pub revision: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub locked: bool,
    pub editable: bool,
    pub fields: Vec<FieldView>,
    pub tags: Vec<String>,
    pub xrefs: Vec<Xref>,
    pub attachments: Vec<AttachmentView>,
    pub log: Vec<LogLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub entity: EntityKind,
    pub name: String,
    pub id: String,
    pub url: String,
}

/// An edit of one document.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    pub values: RequestValues,
    /// Revision the edit is based on; `None` skips the check.
    pub revision: Option<String>,
    pub upload: Option<Upload>,
}

impl UpdateRequest {
    #[must_use]
    pub fn new(values: RequestValues) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn at_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    #[must_use]
    pub fn with_upload(mut self, upload: Upload) -> Self {
        self.upload = Some(upload);
        self
    }
}

/// The document after the last committed step, and one record per step.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub document: Document,
    pub log: Vec<LogRecord>,
}

/// Stored value, with a missing key read as `null`.
fn stored_value(doc: &Document, field: &str) -> Value {
    doc.get(field).cloned().unwrap_or(Value::Null)
}

fn comment_of(values: &RequestValues) -> Option<String> {
    values.first(COMMENT_KEY).and_then(normalize)
}

fn without_tags(tags: &[String], remove: &[String]) -> Vec<String> {
    let remove: BTreeSet<&str> = remove.iter().map(|tag| tag.trim()).collect();
    tags.iter()
        .filter(|tag| !remove.contains(tag.as_str()))
        .cloned()
        .collect()
}

fn with_tags(tags: &[String], add: &[String]) -> Vec<String> {
    let mut merged: BTreeSet<String> = tags.iter().cloned().collect();
    merged.extend(
        add.iter()
            .flat_map(|input| input.split_whitespace())
            .map(String::from),
    );
    merged.into_iter().collect()
}

fn without_xrefs(xrefs: &[Xref], uris: &[String]) -> Vec<Xref> {
    let uris: BTreeSet<&str> = uris.iter().map(|uri| uri.trim()).collect();
    xrefs
        .iter()
        .filter(|xref| !uris.contains(xref.uri.as_str()))
        .cloned()
        .collect()
}

/// Add or retitle the xref of `uri`; unique by URI, sorted by URI.
fn with_xref(xrefs: &[Xref], uri: &str, title: Option<String>) -> Vec<Xref> {
    let mut merged: Vec<Xref> = xrefs.iter().filter(|xref| xref.uri != uri).cloned().collect();
    merged.push(Xref {
        uri: uri.to_string(),
        title,
    });
    merged.sort_by(|a, b| a.uri.cmp(&b.uri));
    merged
}

/// Actions named by the request, checked against the schema and the actor.
fn resolve_actions(
    schema: &EntitySchema,
    actor: &Actor,
    doc: &Document,
    values: &RequestValues,
) -> Result<Vec<&'static ActionSpec>, CoreError> {
    let mut resolved: Vec<&'static ActionSpec> = Vec::new();
    for raw in values.all(ACTION_KEY) {
        let Some(name) = normalize(raw) else {
            continue;
        };
        let action = schema.action(&name).ok_or_else(|| {
            CoreError::BadRequest(format!("no such action '{name}' for {}", schema.kind))
        })?;
        if !(action.allowed)(actor) {
            return Err(edit_forbidden(actor, format!("action {name} on {}", doc.label())));
        }
        if !resolved.iter().any(|known| known.name == action.name) {
            resolved.push(action);
        }
    }
    Ok(resolved)
}

/// A request that does nothing but unlock, which is the one edit a locked
/// document admits.
fn is_unlock_only(request: &UpdateRequest, actions: &[&ActionSpec]) -> bool {
    !actions.is_empty()
        && actions
            .iter()
            .all(|action| action.effect == ActionEffect::Unlock)
        && request.upload.is_none()
        && request
            .values
            .keys()
            .all(|key| key == ACTION_KEY || key == COMMENT_KEY)
}

/// Everything an update will do, validated before the first write.
struct StagedUpdate {
    fields: Option<(Document, Vec<&'static str>)>,
    attachment_deletes: Vec<String>,
    upload: Option<(Upload, Vec<u8>)>,
    xref_add: Option<(String, Option<String>)>,
    actions: Vec<&'static ActionSpec>,
}

impl LimsService {
    /// View a named document.
    ///
    /// # Errors
    ///
    /// `NotFound`, `ViewForbidden`, store failures.
    pub async fn view(
        &self,
        actor: &Actor,
        entity: EntityKind,
        name: &str,
    ) -> Result<EntityView, DatabaseError> {
        let doc = self.require_named(entity, name).await?;
        let schema = schema_for(entity);
        schema.check_viewable(self.db(), actor, &doc).await?;
        debug!(doc = %doc.label(), account = %actor.name, "view");

        for field in schema.fields {
            if let FieldKind::Reference(kind) = field.kind
                && let Some(target) = doc.get_str(field.name)
                && !self.db().name_exists(kind, target).await?
            {
                warn!(doc = %doc.label(), field = field.name, reference = target, "dangling reference");
            }
        }

        let attachments = doc
            .attachments
            .iter()
            .map(|(filename, stub)| AttachmentView {
                filename: filename.clone(),
                content_type: stub.content_type.clone(),
                length: stub.length,
                url: self.site().attachment_url(entity, name, filename),
            })
            .collect();
        let log = self
            .log_records(&doc.id)
            .await?
            .into_iter()
            .map(|record| LogLine {
                action: record.action,
                account: record.account,
                timestamp: record.timestamp,
                comment: record.comment,
            })
            .collect();

        Ok(EntityView {
            entity,
            id: doc.id.clone(),
            name: doc.name().map(String::from),
            revision: doc.revision.clone(),
            timestamp: doc.timestamp,
            url: self.site().entity_url(entity, name),
            locked: doc.is_locked(),
            editable: schema.is_editable(actor, &doc),
            fields: schema.fields.iter().map(|field| field.render_view(&doc)).collect(),
            tags: doc.tags.clone(),
            xrefs: doc.xrefs.clone(),
            attachments,
            log,
        })
    }

    /// Create a document of `entity` from request values.
    ///
    /// # Errors
    ///
    /// `EditForbidden` without creation privilege or when targeting a field
    /// the actor may not set; `MissingField`/`InvalidValue` from parsing;
    /// `InvalidValue` on `name` when the store rejects a duplicate.
    pub async fn create(
        &self,
        actor: &Actor,
        entity: EntityKind,
        values: RequestValues,
    ) -> Result<Document, DatabaseError> {
        let mut doc = self.build_document(actor, entity, &values).await?;
        let record = self
            .new_log_record(&doc, actor, actions::CREATED, comment_of(&values), None)
            .await?;
        doc.revision = Some(self.db().save_logged(&doc, &record).await?);
        logged(&doc, &record);
        info!(doc = %doc.label(), account = %actor.name, "created");
        Ok(doc)
    }

    /// A new, validated and unsaved document of `entity`.
    pub(crate) async fn build_document(
        &self,
        actor: &Actor,
        entity: EntityKind,
        values: &RequestValues,
    ) -> Result<Document, DatabaseError> {
        let mut values = values.clone();
        let schema = schema_for(entity);
        schema.check_creatable(actor)?;
        for field in schema.fields {
            if field.is_targeted(&values) && !field.is_editable(None, actor, true) {
                return Err(edit_forbidden(actor, format!("field {} of new {entity}", field.name)).into());
            }
            field.apply_default(&mut values, actor);
        }

        let id = self.db().generate_id(prefix_for(entity)).await?;
        let mut doc = Document::new(id, entity, Utc::now());
        let ctx = FieldContext::new(self.db(), actor, entity, None);
        for field in schema.fields {
            if let Parsed::Provided(value) = field
                .parse_and_validate(&ctx, &values, field.required)
                .await?
            {
                doc.set(field.name, value);
            }
        }
        if let Some(setup) = schema.setup {
            setup(&mut doc);
        }
        if let Some(before_save) = schema.before_save {
            before_save(&mut doc);
        }
        Ok(doc)
    }

    /// Update a named document.
    ///
    /// # Errors
    ///
    /// See [`LimsService::apply_update`].
    pub async fn update(
        &self,
        actor: &Actor,
        entity: EntityKind,
        name: &str,
        request: UpdateRequest,
    ) -> Result<UpdateOutcome, DatabaseError> {
        let doc = self.require_named(entity, name).await?;
        self.apply_update(actor, doc, request).await
    }

    /// Apply an update to `doc`.
    ///
    /// A request that changes nothing writes nothing and returns an empty
    /// log.
    ///
    /// # Errors
    ///
    /// `ViewForbidden`/`EditForbidden` from the access gates, `BadRequest`
    /// for unknown actions, `RevisionConflict` for a stale revision,
    /// validation failures; all of these before any write. Store failures
    /// of a later step leave the earlier steps committed.
    pub async fn apply_update(
        &self,
        actor: &Actor,
        doc: Document,
        request: UpdateRequest,
    ) -> Result<UpdateOutcome, DatabaseError> {
        let schema = schema_for(doc.entity);
        schema.check_viewable(self.db(), actor, &doc).await?;
        let actions = resolve_actions(schema, actor, &doc, &request.values)?;
        let entity_editable = schema.is_editable(actor, &doc);
        if !entity_editable && !(doc.is_locked() && is_unlock_only(&request, &actions)) {
            schema.check_editable(actor, &doc)?;
        }
        if let Some(expected) = &request.revision
            && doc.revision.as_ref() != Some(expected)
        {
            return Err(CoreError::RevisionConflict {
                id: doc.id.clone(),
                expected: expected.clone(),
                actual: doc.revision_str().to_string(),
            }
            .into());
        }

        let staged = self
            .stage_update(actor, schema, &doc, &request, actions, entity_editable)
            .await?;
        self.commit_update(actor, doc, &request, staged).await
    }

    async fn stage_update(
        &self,
        actor: &Actor,
        schema: &'static EntitySchema,
        doc: &Document,
        request: &UpdateRequest,
        actions: Vec<&'static ActionSpec>,
        entity_editable: bool,
    ) -> Result<StagedUpdate, DatabaseError> {
        let values = &request.values;
        let fields = self
            .stage_fields(actor, schema, doc, values, entity_editable)
            .await?;

        let mut attachment_deletes: Vec<String> = Vec::new();
        for raw in values.all(ATTACHMENT_DELETE_KEY) {
            let Some(filename) = normalize(raw) else {
                continue;
            };
            if !doc.attachments.contains_key(&filename) {
                return Err(CoreError::not_found("attachment", format!("{}/{filename}", doc.label())).into());
            }
            if !attachment_deletes.contains(&filename) {
                attachment_deletes.push(filename);
            }
        }

        if !attachment_deletes.is_empty() || request.upload.is_some() {
            Self::check_attachment_edit(actor, doc)?;
        }
        let upload = match &request.upload {
            Some(upload) => {
                let content = upload.decode()?;
                Some((upload.clone(), content))
            }
            None => None,
        };

        let xref_add = match values.first(XREF_ADD_URI_KEY).and_then(normalize) {
            Some(uri) => Some((uri, values.first(XREF_ADD_TITLE_KEY).and_then(normalize))),
            None if values.first(XREF_ADD_TITLE_KEY).and_then(normalize).is_some() => {
                return Err(CoreError::invalid("xref", "a title needs a URI").into());
            }
            None => None,
        };

        Ok(StagedUpdate {
            fields,
            attachment_deletes,
            upload,
            xref_add,
            actions,
        })
    }

    /// Parse every targeted field against `doc` and merge the changes.
    ///
    /// A targeted field the actor may not edit is rejected unless its parsed
    /// value equals the stored one. Returns the merged document and the
    /// names of the modified fields in schema order, or `None` when nothing
    /// changes.
    async fn stage_fields(
        &self,
        actor: &Actor,
        schema: &'static EntitySchema,
        doc: &Document,
        values: &RequestValues,
        entity_editable: bool,
    ) -> Result<Option<(Document, Vec<&'static str>)>, DatabaseError> {
        let ctx = FieldContext::new(self.db(), actor, schema.kind, Some(doc));
        let mut merged = doc.clone();
        for field in schema.fields {
            if !field.is_targeted(values) {
                continue;
            }
            let Parsed::Provided(value) = field.parse_and_validate(&ctx, values, false).await?
            else {
                continue;
            };
            if value == stored_value(doc, field.name) {
                continue;
            }
            if !field.is_editable(Some(doc), actor, entity_editable) {
                return Err(edit_forbidden(
                    actor,
                    format!("field {} of {}", field.name, doc.label()),
                )
                .into());
            }
            merged.set(field.name, value);
        }
        if let Some(before_save) = schema.before_save {
            before_save(&mut merged);
        }

        let modified: Vec<&'static str> = schema
            .fields
            .iter()
            .filter(|field| stored_value(&merged, field.name) != stored_value(doc, field.name))
            .map(|field| field.name)
            .collect();
        Ok((!modified.is_empty()).then_some((merged, modified)))
    }

    async fn commit_update(
        &self,
        actor: &Actor,
        mut current: Document,
        request: &UpdateRequest,
        staged: StagedUpdate,
    ) -> Result<UpdateOutcome, DatabaseError> {
        let values = &request.values;
        let comment = comment_of(values);
        let mut log = Vec::new();

        if let Some((merged, modified)) = staged.fields {
            let record = self
                .commit_step(actor, &mut current, merged, actions::modified(&modified), comment.clone())
                .await?;
            log.push(record);
        }

        for filename in &staged.attachment_deletes {
            let record = self
                .delete_attachment_step(actor, &mut current, filename, comment.as_deref())
                .await?;
            log.push(record);
        }

        if let Some((upload, content)) = &staged.upload {
            let record = self
                .upload_step(actor, &mut current, upload, content, comment.as_deref())
                .await?;
            log.push(record);
        }

        let tags = without_tags(&current.tags, values.all(TAG_REMOVE_KEY));
        if tags == current.tags {
            debug!(doc = %current.label(), "no tags removed");
        } else {
            let mut next = current.clone();
            next.tags = tags;
            log.push(
                self.commit_step(actor, &mut current, next, actions::REMOVED_TAGS, None)
                    .await?,
            );
        }

        let tags = with_tags(&current.tags, values.all(TAGS_ADD_KEY));
        if tags != current.tags {
            let mut next = current.clone();
            next.tags = tags;
            log.push(
                self.commit_step(actor, &mut current, next, actions::ADDED_TAGS, None)
                    .await?,
            );
        }

        let xrefs = without_xrefs(&current.xrefs, values.all(XREF_REMOVE_KEY));
        if xrefs != current.xrefs {
            let mut next = current.clone();
            next.xrefs = xrefs;
            log.push(
                self.commit_step(actor, &mut current, next, actions::REMOVED_XREFS, None)
                    .await?,
            );
        }

        if let Some((uri, title)) = staged.xref_add {
            let xrefs = with_xref(&current.xrefs, &uri, title);
            if xrefs != current.xrefs {
                let mut next = current.clone();
                next.xrefs = xrefs;
                log.push(
                    self.commit_step(actor, &mut current, next, actions::ADDED_XREF, None)
                        .await?,
                );
            }
        }

        for action in staged.actions {
            let (locked, text) = match action.effect {
                ActionEffect::Lock => (true, actions::LOCKED),
                ActionEffect::Unlock => (false, actions::UNLOCKED),
            };
            if current.is_locked() == locked {
                debug!(doc = %current.label(), action = action.name, "already in effect");
                continue;
            }
            let mut next = current.clone();
            next.set("locked", Value::Bool(locked));
            log.push(self.commit_step(actor, &mut current, next, text, None).await?);
        }

        if log.is_empty() {
            debug!(doc = %current.label(), "no-op update");
        }
        Ok(UpdateOutcome {
            document: current,
            log,
        })
    }

    /// Save `next` as the successor of `current` together with the log record
    /// holding the pre-image; `current` becomes the saved document.
    async fn commit_step(
        &self,
        actor: &Actor,
        current: &mut Document,
        mut next: Document,
        action: impl Into<String>,
        comment: Option<String>,
    ) -> Result<LogRecord, DatabaseError> {
        let record = self
            .new_log_record(&next, actor, action, comment, Some(current.clone()))
            .await?;
        next.revision = Some(self.db().save_logged(&next, &record).await?);
        *current = next;
        logged(current, &record);
        Ok(record)
    }

    /// Documents of a kind the actor may view, by name, optionally only
    /// those of one operator.
    ///
    /// # Errors
    ///
    /// `BadRequest` when filtering by operator on a kind without an
    /// operator index; store failures.
    pub async fn list(
        &self,
        actor: &Actor,
        entity: EntityKind,
        operator: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ListItem>, DatabaseError> {
        let schema = schema_for(entity);
        let rows = match operator {
            Some(operator) => {
                if schema.index("operator").is_none() {
                    return Err(CoreError::BadRequest(format!("{entity} has no operator")).into());
                }
                self.db()
                    .find_by_index(entity, "operator", &IndexKey::Exact(operator.to_string()))
                    .await?
            }
            None => self.db().find_by_index(entity, "name", &IndexKey::All).await?,
        };

        let mut items = Vec::new();
        for row in rows {
            if items.len() >= limit {
                break;
            }
            let Some(doc) = self.db().get(&row.id).await? else {
                continue;
            };
            if !schema.is_viewable(self.db(), actor, &doc).await? {
                continue;
            }
            items.push(ListItem {
                entity,
                url: self.site().entity_url(entity, &row.name),
                name: row.name,
                id: row.id,
            });
        }
        Ok(items)
    }
}
