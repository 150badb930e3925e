//! Sample sets: the membership of a workset.

use std::collections::BTreeSet;

use lims_core::enums::EntityKind;
use lims_core::errors::CoreError;
use lims_core::store::{DocumentStore, IndexKey};
use serde_json::Value;

use crate::field::{FieldContext, FieldSpec, Parsed};
use crate::request::{RequestValues, normalize};

/// Members of another workset, unless it is the document being edited.
async fn workset_members<S: DocumentStore>(
    field: &FieldSpec,
    ctx: &FieldContext<'_, S>,
    name: &str,
) -> Result<Vec<String>, CoreError> {
    if ctx.current.and_then(|doc| doc.name()) == Some(name) {
        return Ok(Vec::new());
    }
    Ok(ctx
        .store
        .get_named(ctx.entity, name)
        .await?
        .map(|doc| doc.get_strings(field.name))
        .unwrap_or_default())
}

pub(crate) async fn parse<S: DocumentStore>(
    field: &FieldSpec,
    ctx: &FieldContext<'_, S>,
    values: &RequestValues,
) -> Result<Parsed, CoreError> {
    let name = field.name;
    let original: BTreeSet<String> = ctx
        .current
        .map(|doc| doc.get_strings(name))
        .unwrap_or_default()
        .into_iter()
        .collect();
    let mut samples = original.clone();

    if let Some(listed) = values.first(name) {
        samples.extend(listed.replace(',', " ").split_whitespace().map(String::from));
    }
    if let Some(project) = values.first(&format!("{name}_project")).and_then(normalize) {
        let rows = ctx
            .store
            .find_by_index(EntityKind::Sample, "project", &IndexKey::Exact(project))
            .await?;
        samples.extend(rows.into_iter().map(|row| row.name));
    }
    if let Some(workset) = values.first(&format!("{name}_workset")).and_then(normalize) {
        samples.extend(workset_members(field, ctx, &workset).await?);
    }
    if let Some(workset) = values
        .first(&format!("{name}_workset_remove"))
        .and_then(normalize)
    {
        for sample in workset_members(field, ctx, &workset).await? {
            samples.remove(&sample);
        }
    }
    for sample in values.all(&format!("{name}_remove")) {
        samples.remove(sample.trim());
    }

    let added: Vec<String> = samples.difference(&original).cloned().collect();
    for sample in added {
        if !ctx.store.name_exists(EntityKind::Sample, &sample).await? {
            samples.remove(&sample);
        }
    }
    if samples == original {
        return Ok(Parsed::Absent);
    }
    Ok(Parsed::Provided(Value::from(
        samples.into_iter().collect::<Vec<_>>(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;
    use crate::test_support::{MemoryStore, actor, stored};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn field() -> FieldSpec {
        FieldSpec::new("samples", FieldKind::SampleSet { grid: Some("grid") })
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        for (sample, project) in [("s1", "P1"), ("s2", "P1"), ("s3", "P2"), ("s4", "P2")] {
            store.insert(stored(EntityKind::Sample, sample, json!({"project": project})));
        }
        store.insert(stored(EntityKind::Workset, "w2", json!({"samples": ["s3", "s4"]})));
        store
    }

    #[tokio::test]
    async fn adds_listed_and_project_samples_dropping_unknown() {
        let store = store();
        let actor = actor();
        let ctx = FieldContext::new(&store, &actor, EntityKind::Workset, None);
        let values = RequestValues::new()
            .with("samples", "s3, ghost")
            .with("samples_project", "P1");

        let parsed = parse(&field(), &ctx, &values).await.unwrap();
        assert_eq!(parsed, Parsed::Provided(json!(["s1", "s2", "s3"])));
    }

    #[tokio::test]
    async fn workset_add_and_remove() {
        let store = store();
        let actor = actor();
        let current = stored(EntityKind::Workset, "w1", json!({"samples": ["s1", "s3"]}));
        let ctx = FieldContext::new(&store, &actor, EntityKind::Workset, Some(&current));

        let removed = parse(&field(), &ctx, &RequestValues::new().with("samples_workset_remove", "w2"))
            .await
            .unwrap();
        assert_eq!(removed, Parsed::Provided(json!(["s1"])));

        let added = parse(&field(), &ctx, &RequestValues::new().with("samples_workset", "w2"))
            .await
            .unwrap();
        assert_eq!(added, Parsed::Provided(json!(["s1", "s3", "s4"])));
    }

    #[tokio::test]
    async fn self_reference_and_unchanged_set_are_absent() {
        let store = store();
        let actor = actor();
        let current = stored(EntityKind::Workset, "w2", json!({"samples": ["s3", "s4"]}));
        let ctx = FieldContext::new(&store, &actor, EntityKind::Workset, Some(&current));
        let values = RequestValues::new()
            .with("samples_workset_remove", "w2")
            .with("samples", "s3");

        assert_eq!(parse(&field(), &ctx, &values).await.unwrap(), Parsed::Absent);
    }

    #[tokio::test]
    async fn removes_individual_samples() {
        let store = store();
        let actor = actor();
        let current = stored(EntityKind::Workset, "w2", json!({"samples": ["s3", "s4"]}));
        let ctx = FieldContext::new(&store, &actor, EntityKind::Workset, Some(&current));
        let values = RequestValues::new().with("samples_remove", "s4");

        assert_eq!(
            parse(&field(), &ctx, &values).await.unwrap(),
            Parsed::Provided(json!(["s3"]))
        );
    }
}
