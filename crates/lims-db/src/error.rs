//! Database error types for lims-db.

use lims_core::errors::CoreError;
use lims_core::store::StoreError;
use thiserror::Error;

/// Errors from database and service operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Validation, access or lookup failure from the entity framework.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Unknown account or wrong password; deliberately not saying which.
    #[error("Invalid account name or password")]
    AuthenticationFailed,

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<StoreError> for DatabaseError {
    fn from(error: StoreError) -> Self {
        Self::Core(error.into())
    }
}

impl DatabaseError {
    /// The core failure kind, if this is one.
    #[must_use]
    pub const fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(error) => Some(error),
            _ => None,
        }
    }
}
