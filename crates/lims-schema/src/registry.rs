//! Central schema registry.
//!
//! Holds JSON Schemas for the shared record types (generated with
//! [`schemars::schema_for!`]) and one schema per entity kind describing its
//! field values, derived from the static field declarations. Validation goes
//! through `jsonschema`.

use std::collections::HashMap;

use lims_core::entities::Document;
use lims_core::enums::EntityKind;
use schemars::schema_for;
use serde_json::{Value, json};

use crate::entities::schema_for as entity_schema;
use crate::error::SchemaError;
use crate::field::{FieldKind, FieldSpec};

/// Central store of all JSON Schemas of the tracker.
pub struct SchemaRegistry {
    schemas: HashMap<&'static str, Value>,
}

macro_rules! register {
    ($map:expr, $name:expr, $ty:ty) => {
        $map.insert($name, Value::from(schema_for!($ty)));
    };
}

impl SchemaRegistry {
    /// Build a registry with the record schemas and every entity schema.
    #[must_use]
    pub fn new() -> Self {
        let mut schemas = HashMap::new();

        register!(schemas, "document", lims_core::entities::Document);
        register!(schemas, "log_record", lims_core::entities::LogRecord);
        register!(schemas, "xref", lims_core::entities::Xref);
        register!(schemas, "attachment_stub", lims_core::entities::AttachmentStub);
        register!(schemas, "actor", lims_core::identity::Actor);

        for kind in EntityKind::ALL {
            schemas.insert(kind.as_str(), entity_json_schema(kind));
        }

        Self { schemas }
    }

    /// Get a schema by name. Returns `None` if not found.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    /// Validate a JSON value against a named schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NotFound` if the schema name is unknown, or
    /// `SchemaError::ValidationFailed` if validation produces errors.
    pub fn validate(&self, name: &str, instance: &Value) -> Result<(), SchemaError> {
        let schema = self
            .get(name)
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))?;

        let validator =
            jsonschema::validator_for(schema).map_err(|e| SchemaError::Generation(format!("{e}")))?;

        let errors: Vec<String> = validator
            .iter_errors(instance)
            .map(|e| format!("{e}"))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::ValidationFailed { errors })
        }
    }

    /// Validate a stored document against the shared document schema and
    /// the schema of its entity kind.
    ///
    /// # Errors
    ///
    /// `SchemaError::ValidationFailed` listing every violation.
    pub fn validate_document(&self, doc: &Document) -> Result<(), SchemaError> {
        let value =
            serde_json::to_value(doc).map_err(|e| SchemaError::Generation(format!("{e}")))?;
        self.validate("document", &value)?;
        self.validate(doc.entity.as_str(), &value)
    }

    /// List all registered schema names.
    #[must_use]
    pub fn list(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.schemas.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn string_array() -> Value {
    json!({"type": "array", "items": {"type": "string"}})
}

/// Schema of one stored field value, before nullability.
fn field_value_schema(field: &FieldSpec) -> Value {
    match field.kind {
        FieldKind::String | FieldKind::Text | FieldKind::Reference(_) => json!({"type": "string"}),
        FieldKind::Name => json!({"type": "string", "pattern": "^[A-Za-z0-9][A-Za-z0-9_-]*$"}),
        FieldKind::Password => json!({"type": "string", "pattern": "^[0-9a-f]{64}$"}),
        FieldKind::Timestamp => json!({
            "type": "string",
            "pattern": "^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}Z$"
        }),
        FieldKind::Integer => json!({"type": "integer"}),
        FieldKind::PositiveInteger => json!({"type": "integer", "minimum": 1}),
        FieldKind::Float => json!({"type": "number"}),
        FieldKind::Boolean => json!({"type": "boolean"}),
        FieldKind::Option(options) => json!({"enum": options}),
        FieldKind::ReferenceList(_) | FieldKind::SampleSet { .. } | FieldKind::Steps => {
            string_array()
        }
        FieldKind::Status(statuses) => {
            let names: Vec<&str> = statuses.iter().map(|status| status.name).collect();
            json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"enum": names},
                        "value": {"type": "string"},
                        "timestamp": {"type": "string"}
                    },
                    "required": ["name", "value", "timestamp"]
                }
            })
        }
        FieldKind::SampleGrid { .. } => {
            let dimension = json!({"type": ["integer", "null"], "minimum": 1});
            json!({
                "type": "object",
                "properties": {
                    "rows": dimension,
                    "columns": dimension,
                    "multiplex": dimension,
                    "arrangement": {
                        "type": "array",
                        "items": {"type": "array", "items": {"type": "array",
                            "items": {"type": ["string", "null"]}}}
                    }
                }
            })
        }
    }
}

/// JSON Schema of the documents of one entity kind.
#[must_use]
pub fn entity_json_schema(kind: EntityKind) -> Value {
    let schema = entity_schema(kind);
    let mut properties = serde_json::Map::new();
    properties.insert("entity".into(), json!({"const": kind.as_str()}));
    let mut required = vec![Value::from("entity")];
    for field in schema.fields {
        let value = field_value_schema(field);
        let value = if field.required {
            required.push(Value::from(field.name));
            value
        } else {
            json!({"anyOf": [value, {"type": "null"}]})
        };
        properties.insert(field.name.into(), value);
    }
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": kind.as_str(),
        "description": schema.description,
        "type": "object",
        "properties": properties,
        "required": required
    })
}
