//! # lims-schema
//!
//! The declarative entity/field framework.
//!
//! - [`field`]: the Field contract (`parse_and_validate`, `is_editable`,
//!   `render_view`, `render_edit_control`) over a closed set of variants.
//! - [`kinds`]: per-variant parsing and validation.
//! - [`request`]: the flat multi-valued request model.
//! - [`render`]: presentation descriptors for views and forms.
//! - [`policy`]: entity-level visibility and edit rules.
//! - [`entities`]: the static schema of every entity kind.
//! - [`registry`]: JSON Schemas for documents and per-entity field sets.

pub mod entities;
pub mod error;
pub mod field;
pub mod kinds;
pub mod policy;
pub mod registry;
pub mod render;
pub mod request;

#[cfg(test)]
mod test_support;

pub use entities::{EntitySchema, schema_for};
pub use error::SchemaError;
pub use field::{FieldContext, FieldDefault, FieldKind, FieldSpec, Parsed};
pub use registry::SchemaRegistry;
pub use request::RequestValues;
