//! # lims-db
//!
//! libSQL persistence and entity orchestration for the sample tracker.
//!
//! - [`LimsDb`] implements the `DocumentStore` adapter: JSON documents with a
//!   revision column, attachment blobs, secondary index queries over the JSON
//!   bodies, and a store-level unique name index per entity kind.
//! - [`service::LimsService`] runs the entity protocol on top of it: view,
//!   create, multi-step update with one log record per committed step,
//!   attachments, queries, accounts and bulk sample creation.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
mod store;

#[cfg(test)]
pub(crate) mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle.
///
/// Wraps a libSQL database and connection. Provides ID and revision token
/// generation; the `DocumentStore` implementation lives in `store.rs`.
pub struct LimsDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl LimsDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let lims_db = Self { db, conn };
        lims_db.run_migrations().await?;
        Ok(lims_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Lowercase hex of `bytes` random bytes, drawn from `randomblob`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn random_hex(&self, bytes: u8) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(&format!("SELECT lower(hex(randomblob({bytes})))"), ())
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }

    /// Generate a prefixed document ID, e.g. `"smp-3fa81c0b9d2e4a17"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        Ok(format!("{prefix}-{}", self.random_hex(8).await?))
    }
}
