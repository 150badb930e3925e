//! Raw document access by ID.

use lims_core::entities::Document;
use lims_core::enums::EntityKind;
use lims_core::identity::Actor;
use lims_schema::policy::edit_forbidden;
use lims_schema::schema_for;
use serde::Serialize;

use crate::error::DatabaseError;
use crate::service::LimsService;

/// Where a document ID leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub id: String,
    pub entity: EntityKind,
    pub name: String,
    pub url: String,
}

impl LimsService {
    /// The stored JSON document, for admins and managers only.
    ///
    /// # Errors
    ///
    /// `EditForbidden` for other roles, `NotFound`.
    pub async fn raw_document(&self, actor: &Actor, id: &str) -> Result<Document, DatabaseError> {
        if !actor.role.is_manager() {
            return Err(edit_forbidden(actor, format!("raw document {id}")).into());
        }
        self.require_id(id).await
    }

    /// Entity kind, name and URL of a document ID.
    ///
    /// # Errors
    ///
    /// `NotFound`, `ViewForbidden`.
    pub async fn locate(&self, actor: &Actor, id: &str) -> Result<Location, DatabaseError> {
        let doc = self.require_id(id).await?;
        schema_for(doc.entity)
            .check_viewable(self.db(), actor, &doc)
            .await?;
        let name = doc.name().unwrap_or(&doc.id).to_string();
        Ok(Location {
            id: doc.id.clone(),
            entity: doc.entity,
            url: self.site().entity_url(doc.entity, &name),
            name,
        })
    }
}
