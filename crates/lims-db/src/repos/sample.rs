//! Bulk sample creation within one project.

use std::collections::BTreeSet;

use lims_core::entities::{Document, actions};
use lims_core::enums::EntityKind;
use lims_core::errors::CoreError;
use lims_core::identity::Actor;
use lims_schema::RequestValues;
use lims_schema::kinds::name::is_valid_name;
use lims_schema::request::normalize;
use lims_schema::schema_for;
use serde::Deserialize;

use crate::error::DatabaseError;
use crate::service::LimsService;

/// One sample to define. Drafts without a name are skipped.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SampleDraft {
    pub name: Option<String>,
    pub altname: Option<String>,
    /// Defaults to the project's reference.
    pub reference: Option<String>,
    pub amount: Option<f64>,
    pub concentration: Option<f64>,
}

impl SampleDraft {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    fn values(&self, name: &str, project: &Document) -> RequestValues {
        let mut values = RequestValues::new().with("name", name);
        if let Some(project) = project.name() {
            values.insert("project", project);
        }
        if let Some(altname) = &self.altname {
            values.insert("altname", altname.as_str());
        }
        if let Some(reference) = self
            .reference
            .as_deref()
            .or_else(|| project.get_str("reference"))
        {
            values.insert("reference", reference);
        }
        if let Some(amount) = self.amount {
            values.insert("amount", amount.to_string());
        }
        if let Some(concentration) = self.concentration {
            values.insert("concentration", concentration.to_string());
        }
        values
    }
}

impl LimsService {
    /// Define several samples in `project`.
    ///
    /// Every draft is validated before the first sample is saved. Each
    /// sample is logged as defined, and the project gets one record listing
    /// them.
    ///
    /// # Errors
    ///
    /// `NotFound` for the project, `ViewForbidden`, `EditForbidden` without
    /// the privilege to create samples, `InvalidValue` for a bad, taken or
    /// repeated name or a bad value.
    pub async fn add_samples(
        &self,
        actor: &Actor,
        project: &str,
        drafts: &[SampleDraft],
    ) -> Result<Vec<Document>, DatabaseError> {
        let project = self.require_named(EntityKind::Project, project).await?;
        schema_for(EntityKind::Project)
            .check_viewable(self.db(), actor, &project)
            .await?;
        schema_for(EntityKind::Sample).check_creatable(actor)?;

        let mut seen = BTreeSet::new();
        let mut pending = Vec::new();
        for draft in drafts {
            let Some(name) = draft.name.as_deref().and_then(normalize) else {
                continue;
            };
            if !is_valid_name(&name) {
                return Err(CoreError::invalid("name", format!("'{name}' is not a valid identifier")).into());
            }
            if !seen.insert(name.clone()) {
                return Err(CoreError::invalid("name", format!("'{name}' is given more than once")).into());
            }
            let values = draft.values(&name, &project);
            pending.push(
                self.build_document(actor, EntityKind::Sample, &values)
                    .await?,
            );
        }
        if pending.is_empty() {
            return Ok(pending);
        }

        let mut samples = Vec::with_capacity(pending.len());
        for mut doc in pending {
            let record = self
                .new_log_record(&doc, actor, actions::DEFINED, None, None)
                .await?;
            doc.revision = Some(self.db().save_logged(&doc, &record).await?);
            crate::repos::log::logged(&doc, &record);
            samples.push(doc);
        }
        let names: Vec<&str> = samples.iter().filter_map(Document::name).collect();
        self.log_change(
            &project,
            actor,
            actions::ADDED_SAMPLES,
            Some(format!("Samples {}", names.join(", "))),
            None,
        )
        .await?;
        tracing::info!(project = %project.label(), count = samples.len(), "added samples");
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{account, project, seeded_service};
    use lims_core::enums::Role;
    use lims_core::store::{DocumentStore, IndexKey};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn with_project() -> (LimsService, Actor, Document) {
        let (svc, admin) = seeded_service().await;
        account(&svc, &admin, "alice", Role::Customer).await;
        let p1 = project(&svc, &admin, "P1", "alice").await;
        (svc, admin, p1)
    }

    async fn sample_count(svc: &LimsService) -> usize {
        svc.db()
            .find_by_index(EntityKind::Sample, "name", &IndexKey::All)
            .await
            .unwrap()
            .len()
    }

    #[tokio::test]
    async fn defines_samples_and_logs_project() {
        let (svc, admin, p1) = with_project().await;
        let drafts = vec![
            SampleDraft {
                altname: Some("tube 1".into()),
                amount: Some(2.5),
                ..SampleDraft::named("a1")
            },
            SampleDraft::default(),
            SampleDraft {
                reference: Some("mm10".into()),
                ..SampleDraft::named("a2")
            },
        ];
        let samples = svc.add_samples(&admin, "P1", &drafts).await.unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].get_str("reference"), Some("hg19"));
        assert_eq!(samples[0].get("amount"), Some(&json!(2.5)));
        assert_eq!(samples[1].get_str("reference"), Some("mm10"));
        assert_eq!(samples[1].get("status").unwrap()[0]["name"], "defined");

        let log = svc.log_records(&samples[0].id).await.unwrap();
        assert_eq!(log[0].action, "defined");

        let log = svc.log_records(&p1.id).await.unwrap();
        let last = log.last().unwrap();
        assert_eq!(last.action, "added samples");
        assert_eq!(last.comment.as_deref(), Some("Samples a1, a2"));
        assert!(last.initial.is_none());
    }

    #[tokio::test]
    async fn batch_is_rejected_as_a_whole() {
        let (svc, admin, _) = with_project().await;
        svc.add_samples(&admin, "P1", &[SampleDraft::named("a1")])
            .await
            .unwrap();

        for drafts in [
            vec![SampleDraft::named("b1"), SampleDraft::named("b1")],
            vec![SampleDraft::named("b2"), SampleDraft::named("a1")],
            vec![SampleDraft::named("b3"), SampleDraft::named("b 4")],
        ] {
            let error = svc.add_samples(&admin, "P1", &drafts).await.unwrap_err();
            assert!(
                matches!(error.as_core(), Some(CoreError::InvalidValue { field, .. }) if field == "name"),
                "{error}"
            );
        }
        assert_eq!(sample_count(&svc).await, 1);
    }

    #[tokio::test]
    async fn customers_may_not_add_samples() {
        let (svc, _admin, _) = with_project().await;
        let alice = svc.authenticate("alice", "alice").await.unwrap();
        let error = svc
            .add_samples(&alice, "P1", &[SampleDraft::named("c1")])
            .await
            .unwrap_err();
        assert!(matches!(error.as_core(), Some(CoreError::EditForbidden { .. })));
    }

    #[test]
    fn drafts_deserialize_with_defaults() {
        let drafts: Vec<SampleDraft> =
            serde_json::from_value(json!([{"name": "a1", "amount": 1.0}, {}])).unwrap();
        assert_eq!(drafts[0].amount, Some(1.0));
        assert_eq!(drafts[1], SampleDraft::default());
    }
}
