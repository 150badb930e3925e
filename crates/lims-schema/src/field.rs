//! The Field contract: one named, typed, validated attribute of a document.
//!
//! A [`FieldSpec`] is a static declaration. Parsing reads the field's input
//! keys from a [`RequestValues`] and yields a [`Parsed`] tri-state: a value to
//! store (possibly `null`), or `Absent` when the request did not target the
//! field at all. Validation failures are `CoreError`s naming the field.

use lims_core::enums::EntityKind;
use lims_core::errors::CoreError;
use lims_core::identity::Actor;
use lims_core::entities::Document;
use lims_core::store::DocumentStore;
use serde_json::Value;

use crate::kinds::{name, password, reference, sample_grid, sample_set, scalar, status};
use crate::request::RequestValues;

/// Per-field edit restriction, evaluated on top of the entity-level gate.
/// The document is `None` while creating.
pub type FieldPolicy = fn(&Actor, Option<&Document>) -> bool;

/// Default applied on create when the field is not targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Static(&'static str),
    /// The name of the acting account.
    LoginAccount,
}

/// One named status of a `Status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSpec {
    pub name: &'static str,
    pub values: &'static [&'static str],
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Text,
    Integer,
    PositiveInteger,
    Float,
    Boolean,
    Timestamp,
    /// Identifier, unique within the entity kind.
    Name,
    /// One of a fixed set of strings.
    Option(&'static [&'static str]),
    Password,
    Reference(EntityKind),
    ReferenceList(EntityKind),
    Status(&'static [StatusSpec]),
    /// Set of sample names. `grid` names the sibling grid field, if any.
    SampleSet { grid: Option<&'static str> },
    /// Arrangement of the members of the sibling sample-set field `samples`.
    SampleGrid { samples: &'static str },
    /// Ordered list of text lines.
    Steps,
}

impl FieldKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::PositiveInteger => "positive_integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
            Self::Name => "name",
            Self::Option(_) => "option",
            Self::Password => "password",
            Self::Reference(_) => "reference",
            Self::ReferenceList(_) => "reference_list",
            Self::Status(_) => "status",
            Self::SampleSet { .. } => "sample_set",
            Self::SampleGrid { .. } => "sample_grid",
            Self::Steps => "steps",
        }
    }
}

/// Outcome of parsing a field from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// Value to store; `Value::Null` clears the field.
    Provided(Value),
    /// The request did not target the field; leave it untouched.
    Absent,
}

/// What a field sees while parsing: the store for existence and uniqueness
/// checks, the actor, and the document being edited (`None` on create).
pub struct FieldContext<'a, S> {
    pub store: &'a S,
    pub actor: &'a Actor,
    pub entity: EntityKind,
    pub current: Option<&'a Document>,
}

impl<'a, S: DocumentStore> FieldContext<'a, S> {
    pub const fn new(
        store: &'a S,
        actor: &'a Actor,
        entity: EntityKind,
        current: Option<&'a Document>,
    ) -> Self {
        Self {
            store,
            actor,
            entity,
            current,
        }
    }

    /// Stored value of a field of the current document.
    #[must_use]
    pub fn current_value(&self, field: &str) -> Option<&'a Value> {
        self.current.and_then(|doc| doc.get(field))
    }

    #[must_use]
    pub const fn is_create(&self) -> bool {
        self.current.is_none()
    }
}

/// Static declaration of one field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Settable once; immutable after holding a non-null value.
    pub fixed: bool,
    pub default: Option<FieldDefault>,
    pub description: &'static str,
    pub editable: Option<FieldPolicy>,
}

impl FieldSpec {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            fixed: false,
            default: None,
            description: "",
            editable: None,
        }
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    #[must_use]
    pub const fn default_value(mut self, value: &'static str) -> Self {
        self.default = Some(FieldDefault::Static(value));
        self
    }

    #[must_use]
    pub const fn default_login(mut self) -> Self {
        self.default = Some(FieldDefault::LoginAccount);
        self
    }

    #[must_use]
    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub const fn editable_when(mut self, policy: FieldPolicy) -> Self {
        self.editable = Some(policy);
        self
    }

    /// Parse and validate this field's inputs.
    ///
    /// # Errors
    ///
    /// `MissingField` when absent and `required`; `InvalidValue` when a
    /// present value fails coercion, pattern, uniqueness, existence or
    /// domain checks; store failures converted to `CoreError`.
    pub async fn parse_and_validate<S: DocumentStore>(
        &self,
        ctx: &FieldContext<'_, S>,
        values: &RequestValues,
        required: bool,
    ) -> Result<Parsed, CoreError> {
        let parsed = match self.kind {
            FieldKind::Timestamp => scalar::parse_timestamp(self, values)?,
            FieldKind::Name => name::parse(self, ctx, values).await?,
            FieldKind::Password => password::parse(self, values)?,
            FieldKind::Reference(entity) => reference::parse(self, entity, ctx, values).await?,
            FieldKind::ReferenceList(entity) => {
                reference::parse_list(self, entity, ctx, values).await?
            }
            FieldKind::Status(statuses) => status::parse(self, statuses, ctx, values)?,
            FieldKind::SampleSet { .. } => sample_set::parse(self, ctx, values).await?,
            FieldKind::SampleGrid { .. } => sample_grid::parse(self, ctx, values)?,
            FieldKind::String
            | FieldKind::Text
            | FieldKind::Integer
            | FieldKind::PositiveInteger
            | FieldKind::Float
            | FieldKind::Boolean
            | FieldKind::Option(_)
            | FieldKind::Steps => scalar::parse(self, values)?,
        };
        if required && parsed == Parsed::Absent {
            return Err(CoreError::MissingField {
                field: self.name.to_string(),
            });
        }
        Ok(parsed)
    }

    /// Whether the request carries any input key of this field.
    #[must_use]
    pub fn is_targeted(&self, values: &RequestValues) -> bool {
        let name = self.name;
        match self.kind {
            FieldKind::Password => {
                values.contains(&format!("new_{name}")) || values.contains(&format!("confirm_{name}"))
            }
            FieldKind::ReferenceList(_) => {
                values.contains(&format!("{name}_add")) || values.contains(&format!("{name}_remove"))
            }
            FieldKind::Status(statuses) => statuses
                .iter()
                .any(|status| values.contains(&format!("{name}_{}", status.name))),
            FieldKind::SampleSet { .. } => {
                values.contains(name)
                    || ["project", "workset", "workset_remove", "remove"]
                        .iter()
                        .any(|suffix| values.contains(&format!("{name}_{suffix}")))
            }
            FieldKind::SampleGrid { .. } => {
                ["rows", "columns", "multiplex"]
                    .iter()
                    .any(|suffix| values.contains(&format!("{name}_{suffix}")))
                    || values.has_prefix(&format!("{name}_arrangement_"))
            }
            _ => values.contains(name),
        }
    }

    /// `false` once a fixed field holds a value; otherwise the entity-level
    /// gate, further restricted by the field's own policy.
    #[must_use]
    pub fn is_editable(&self, doc: Option<&Document>, actor: &Actor, entity_editable: bool) -> bool {
        if self.fixed && doc.and_then(|doc| doc.get(self.name)).is_some() {
            return false;
        }
        entity_editable && self.editable.is_none_or(|policy| policy(actor, doc))
    }

    /// Raw input the default stands for.
    #[must_use]
    pub fn default_input(&self, actor: &Actor) -> Option<String> {
        match self.default? {
            FieldDefault::Static(value) => Some(value.to_string()),
            FieldDefault::LoginAccount => Some(actor.name.clone()),
        }
    }

    /// Submit the default for an untargeted field.
    pub fn apply_default(&self, values: &mut RequestValues, actor: &Actor) {
        if self.is_targeted(values) {
            return;
        }
        if let Some(input) = self.default_input(actor) {
            values.insert(self.name, input);
        }
    }
}
