//! Persisted record types.
//!
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` so that the
//! registry in `lims-schema` can publish and validate their JSON shape.

mod document;
mod log;

pub use document::{AttachmentStub, Document, Xref};
pub use log::{LogRecord, actions};
