//! Cross-cutting error types.
//!
//! `CoreError` is the taxonomy every failure is reduced to before it reaches
//! the outer boundary. Storage-level failures are raised as `StoreError`
//! (see [`crate::store`]) and converted here.

use thiserror::Error;

use crate::store::StoreError;

/// Errors raised by field validation, access control and entity updates.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required field was absent from the request.
    #[error("Missing value for field '{field}'")]
    MissingField { field: String },

    /// A value failed coercion, pattern, uniqueness or reference checks.
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// The actor may not modify the target.
    #[error("Account '{account}' may not edit {target}")]
    EditForbidden { account: String, target: String },

    /// The actor may not see the target.
    #[error("Account '{account}' may not view {target}")]
    ViewForbidden { account: String, target: String },

    /// Entity, attachment or field lookup returned no result.
    #[error("Not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// The edit was based on a stale revision.
    #[error("Revision conflict on {id}: edit based on {expected}, current is {actual}")]
    RevisionConflict {
        id: String,
        expected: String,
        actual: String,
    },

    /// Malformed request that is not attributable to a single field.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// Shorthand for an `InvalidValue` error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// HTTP-style status code for the failure kind.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MissingField { .. } | Self::InvalidValue { .. } | Self::BadRequest(_) => 400,
            Self::EditForbidden { .. } | Self::ViewForbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::RevisionConflict { .. } => 409,
            Self::Other(_) => 500,
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { id } => Self::not_found("document", id),
            StoreError::RevisionConflict {
                id,
                expected,
                actual,
            } => Self::RevisionConflict {
                id,
                expected,
                actual: actual.unwrap_or_else(|| String::from("<none>")),
            },
            StoreError::NameTaken { entity, name } => {
                Self::invalid("name", format!("{entity} name '{name}' is not unique"))
            }
            StoreError::Backend(message) => Self::Other(anyhow::anyhow!(message)),
        }
    }
}
