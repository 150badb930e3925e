//! Form repository: edit and create forms with their reference choices.

use std::collections::btree_map::Entry;

use lims_core::enums::EntityKind;
use lims_core::errors::CoreError;
use lims_core::identity::Actor;
use lims_core::store::{DocumentStore, IndexKey};
use lims_schema::policy::edit_forbidden;
use lims_schema::render::{EntityForm, FormChoices};
use lims_schema::{FieldSpec, schema_for};

use crate::error::DatabaseError;
use crate::service::LimsService;

impl LimsService {
    /// Current names of every kind the fields refer to.
    async fn form_choices(&self, fields: &[&FieldSpec]) -> Result<FormChoices, DatabaseError> {
        let mut choices = FormChoices::default();
        for kind in fields.iter().filter_map(|field| field.referenced_kind()) {
            if let Entry::Vacant(entry) = choices.names.entry(kind) {
                let rows = self
                    .db()
                    .find_by_index(kind, "name", &IndexKey::All)
                    .await?;
                entry.insert(rows.into_iter().map(|row| row.name).collect());
            }
        }
        Ok(choices)
    }

    /// Form for one field, or every editable field, of an existing document.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown document or field, `ViewForbidden`,
    /// `EditForbidden` when the actor may not edit the document or field.
    pub async fn edit_form(
        &self,
        actor: &Actor,
        entity: EntityKind,
        name: &str,
        field: Option<&str>,
    ) -> Result<EntityForm, DatabaseError> {
        let doc = self.require_named(entity, name).await?;
        let schema = schema_for(entity);
        schema.check_viewable(self.db(), actor, &doc).await?;
        schema.check_editable(actor, &doc)?;

        let fields: Vec<&FieldSpec> = match field {
            Some(field) => {
                let spec = schema
                    .field(field)
                    .ok_or_else(|| CoreError::not_found("field", format!("{entity}/{field}")))?;
                if !spec.is_editable(Some(&doc), actor, true) {
                    return Err(edit_forbidden(actor, format!("field {field} of {}", doc.label())).into());
                }
                vec![spec]
            }
            None => schema
                .fields
                .iter()
                .filter(|spec| spec.is_editable(Some(&doc), actor, true))
                .collect(),
        };
        let choices = self.form_choices(&fields).await?;
        Ok(EntityForm {
            entity,
            name: Some(name.to_string()),
            revision: doc.revision.clone(),
            controls: fields
                .iter()
                .map(|spec| spec.render_edit_control(Some(&doc), actor, &choices))
                .collect(),
        })
    }

    /// Form for a new document of `entity`.
    ///
    /// # Errors
    ///
    /// `EditForbidden` without creation privilege.
    pub async fn create_form(
        &self,
        actor: &Actor,
        entity: EntityKind,
    ) -> Result<EntityForm, DatabaseError> {
        let schema = schema_for(entity);
        schema.check_creatable(actor)?;
        let fields: Vec<&FieldSpec> = schema
            .fields
            .iter()
            .filter(|spec| spec.is_editable(None, actor, true))
            .collect();
        let choices = self.form_choices(&fields).await?;
        Ok(EntityForm {
            entity,
            name: None,
            revision: None,
            controls: fields
                .iter()
                .map(|spec| spec.render_edit_control(None, actor, &choices))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::entity::UpdateRequest;
    use crate::test_support::helpers::{account, create, project, seeded_service};
    use lims_core::enums::Role;
    use lims_schema::RequestValues;
    use lims_schema::render::Widget;

    #[tokio::test]
    async fn unmodified_form_submission_changes_nothing() {
        let (svc, admin) = seeded_service().await;
        account(&svc, &admin, "alice", Role::Customer).await;
        project(&svc, &admin, "P1", "alice").await;
        create(
            &svc,
            &admin,
            EntityKind::Sample,
            RequestValues::new()
                .with("name", "s1")
                .with("project", "P1")
                .with("amount", "1.5")
                .with("location", "freezer"),
        )
        .await;

        for field in ["altname", "project", "amount", "location", "status"] {
            let form = svc
                .edit_form(&admin, EntityKind::Sample, "s1", Some(field))
                .await
                .unwrap();
            let revision = form.revision.clone().unwrap();
            let values = form.controls[0].default_inputs();
            let outcome = svc
                .update(
                    &admin,
                    EntityKind::Sample,
                    "s1",
                    UpdateRequest::new(values).at_revision(revision),
                )
                .await
                .unwrap();
            assert!(outcome.log.is_empty(), "{field} changed on resubmission");
        }
    }

    #[tokio::test]
    async fn reference_choices_come_from_name_index() {
        let (svc, admin) = seeded_service().await;
        account(&svc, &admin, "alice", Role::Customer).await;
        let form = svc.create_form(&admin, EntityKind::Project).await.unwrap();
        let customer = form
            .controls
            .iter()
            .find(|control| control.field == "customer")
            .unwrap();
        let Widget::Select { options, .. } = &customer.widget else {
            panic!("Expected a select");
        };
        let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["alice", "root"]);
    }

    #[tokio::test]
    async fn fixed_field_has_no_edit_form() {
        let (svc, admin) = seeded_service().await;
        account(&svc, &admin, "alice", Role::Customer).await;
        project(&svc, &admin, "P1", "alice").await;
        let error = svc
            .edit_form(&admin, EntityKind::Project, "P1", Some("name"))
            .await
            .unwrap_err();
        assert!(matches!(error.as_core(), Some(CoreError::EditForbidden { .. })));

        let missing = svc
            .edit_form(&admin, EntityKind::Project, "P1", Some("colour"))
            .await
            .unwrap_err();
        assert!(matches!(missing.as_core(), Some(CoreError::NotFound { .. })));
    }
}
