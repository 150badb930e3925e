//! References to other documents by name.

use std::collections::BTreeSet;

use lims_core::enums::EntityKind;
use lims_core::errors::CoreError;
use lims_core::store::DocumentStore;
use serde_json::Value;

use crate::field::{FieldContext, FieldSpec, Parsed};
use crate::request::{NONE_SENTINEL, RequestValues, normalize};

async fn check_exists<S: DocumentStore>(
    field: &FieldSpec,
    entity: EntityKind,
    ctx: &FieldContext<'_, S>,
    name: &str,
) -> Result<(), CoreError> {
    if ctx.store.name_exists(entity, name).await? {
        Ok(())
    } else {
        Err(CoreError::invalid(
            field.name,
            format!("{entity} '{name}' does not exist"),
        ))
    }
}

pub(crate) async fn parse<S: DocumentStore>(
    field: &FieldSpec,
    entity: EntityKind,
    ctx: &FieldContext<'_, S>,
    values: &RequestValues,
) -> Result<Parsed, CoreError> {
    let Some(raw) = values.first(field.name) else {
        return Ok(Parsed::Absent);
    };
    let Some(name) = normalize(raw) else {
        return if field.required {
            Err(CoreError::invalid(field.name, "must be non-null"))
        } else {
            Ok(Parsed::Provided(Value::Null))
        };
    };
    check_exists(field, entity, ctx, &name).await?;
    Ok(Parsed::Provided(Value::String(name)))
}

/// Apply `<f>_remove` then `<f>_add` to the current set. Newly added names
/// must exist; an unchanged set counts as absent.
pub(crate) async fn parse_list<S: DocumentStore>(
    field: &FieldSpec,
    entity: EntityKind,
    ctx: &FieldContext<'_, S>,
    values: &RequestValues,
) -> Result<Parsed, CoreError> {
    let original: BTreeSet<String> = ctx
        .current
        .map(|doc| doc.get_strings(field.name))
        .unwrap_or_default()
        .into_iter()
        .collect();
    let mut names = original.clone();
    for name in values.all(&format!("{}_remove", field.name)) {
        names.remove(name.trim());
    }
    for name in values.all(&format!("{}_add", field.name)) {
        let name = name.trim();
        if !name.is_empty() && name != NONE_SENTINEL {
            names.insert(name.to_string());
        }
    }
    if names == original {
        return Ok(Parsed::Absent);
    }
    for name in names.difference(&original) {
        check_exists(field, entity, ctx, name).await?;
    }
    Ok(Parsed::Provided(Value::from(
        names.into_iter().collect::<Vec<_>>(),
    )))
}
