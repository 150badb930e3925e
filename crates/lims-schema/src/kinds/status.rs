//! Status fields: a list of named statuses, each stamped when set.

use lims_core::errors::CoreError;
use lims_core::store::DocumentStore;
use lims_core::timestamps::now_iso;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::field::{FieldContext, FieldSpec, Parsed, StatusSpec};
use crate::request::{RequestValues, normalize};

/// One set status. The timestamp is always server-assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub name: String,
    pub value: String,
    pub timestamp: String,
}

impl StatusEntry {
    #[must_use]
    pub fn now(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            timestamp: now_iso(),
        }
    }
}

/// Entries of a stored status value; malformed members are skipped.
#[must_use]
pub fn entries(value: Option<&Value>) -> Vec<StatusEntry> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn parse<S: DocumentStore>(
    field: &FieldSpec,
    statuses: &[StatusSpec],
    ctx: &FieldContext<'_, S>,
    values: &RequestValues,
) -> Result<Parsed, CoreError> {
    let original = entries(ctx.current_value(field.name));
    let mut updated = original.clone();
    let mut targeted = false;
    for status in statuses {
        let Some(raw) = values.first(&format!("{}_{}", field.name, status.name)) else {
            continue;
        };
        targeted = true;
        match normalize(raw) {
            None => updated.retain(|entry| entry.name != status.name),
            Some(value) => {
                if !status.values.contains(&value.as_str()) {
                    return Err(CoreError::invalid(
                        field.name,
                        format!("'{value}' is not a valid value for status '{}'", status.name),
                    ));
                }
                let unchanged = updated
                    .iter()
                    .any(|entry| entry.name == status.name && entry.value == value);
                if !unchanged {
                    updated.retain(|entry| entry.name != status.name);
                    updated.push(StatusEntry::now(status.name, &value));
                }
            }
        }
    }
    if !targeted || updated == original {
        return Ok(Parsed::Absent);
    }
    updated.sort_by_key(|entry| {
        statuses
            .iter()
            .position(|status| status.name == entry.name)
            .unwrap_or(usize::MAX)
    });
    let value = serde_json::to_value(updated).map_err(|e| CoreError::Other(e.into()))?;
    Ok(Parsed::Provided(value))
}
