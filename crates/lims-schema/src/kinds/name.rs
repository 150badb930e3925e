//! Identifier fields, unique within their entity kind.

use std::sync::LazyLock;

use lims_core::errors::CoreError;
use lims_core::store::DocumentStore;
use regex::Regex;
use serde_json::Value;

use crate::field::{FieldContext, FieldSpec, Parsed};
use crate::request::{RequestValues, normalize};

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("valid identifier regex")
});

/// Whether a string satisfies the identifier rule: alphanumeric first, then
/// alphanumerics, `_` or `-`.
#[must_use]
pub fn is_valid_name(value: &str) -> bool {
    NAME_RE.is_match(value)
}

/// Check the identifier rule, and uniqueness unless the value is the one the
/// current document already holds.
///
/// # Errors
///
/// `InvalidValue` on a pattern or uniqueness failure.
pub async fn check_name<S: DocumentStore>(
    field: &FieldSpec,
    ctx: &FieldContext<'_, S>,
    value: &str,
) -> Result<(), CoreError> {
    if !is_valid_name(value) {
        return Err(CoreError::invalid(
            field.name,
            format!("'{value}' is not a valid identifier"),
        ));
    }
    let current = ctx.current.and_then(|doc| doc.get_str(field.name));
    if current != Some(value) && ctx.store.name_exists(ctx.entity, value).await? {
        return Err(CoreError::invalid(
            field.name,
            format!("{} name '{value}' is not unique", ctx.entity),
        ));
    }
    Ok(())
}

pub(crate) async fn parse<S: DocumentStore>(
    field: &FieldSpec,
    ctx: &FieldContext<'_, S>,
    values: &RequestValues,
) -> Result<Parsed, CoreError> {
    let Some(raw) = values.first(field.name) else {
        return Ok(Parsed::Absent);
    };
    let Some(value) = normalize(raw) else {
        return if field.required {
            Err(CoreError::invalid(field.name, "must be non-null"))
        } else {
            Ok(Parsed::Provided(Value::Null))
        };
    };
    check_name(field, ctx, &value).await?;
    Ok(Parsed::Provided(Value::String(value)))
}
