//! Service layer orchestrating entity operations with the audit log.
//!
//! `LimsService` wraps `LimsDb` (document store), `SchemaRegistry` (JSON
//! Schema validation) and the site configuration used to build URLs. All repo
//! methods are implemented as `impl LimsService`.

use std::path::Path;

use lims_config::{LimsConfig, SiteConfig};
use lims_core::entities::Document;
use lims_core::enums::EntityKind;
use lims_core::errors::CoreError;
use lims_core::store::DocumentStore;
use lims_schema::SchemaRegistry;

use crate::LimsDb;
use crate::error::DatabaseError;

/// Runs the entity protocol against the store.
///
/// Every mutation follows this order:
/// 1. Authorize and validate everything the request carries
/// 2. Persist the new revision
/// 3. Append one log record holding the pre-image
///
/// Multi-step updates repeat 2-3 per step; a failed step leaves earlier
/// steps committed.
pub struct LimsService {
    db: LimsDb,
    schema: SchemaRegistry,
    site: SiteConfig,
}

impl LimsService {
    /// Create a new service over a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    /// * `site` - Site addresses used for entity and attachment URLs.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str, site: SiteConfig) -> Result<Self, DatabaseError> {
        let db = LimsDb::open_local(db_path).await?;
        Ok(Self::from_db(db, site))
    }

    /// Open the database configured for the project at `project_dir`,
    /// creating its directory when needed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory or database cannot be created.
    pub async fn open(config: &LimsConfig, project_dir: &Path) -> Result<Self, DatabaseError> {
        let path = config.database_path(project_dir);
        if !config.store.is_memory()
            && let Some(parent) = path.parent()
        {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Other(e.into()))?;
        }
        let path = path.to_string_lossy();
        tracing::debug!(path = %path, "opening store");
        Self::new_local(&path, config.site.clone()).await
    }

    /// Create from an existing `LimsDb`.
    #[must_use]
    pub fn from_db(db: LimsDb, site: SiteConfig) -> Self {
        Self {
            db,
            schema: SchemaRegistry::new(),
            site,
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &LimsDb {
        &self.db
    }

    /// Access the schema registry.
    #[must_use]
    pub const fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    #[must_use]
    pub const fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Fetch a document by ID or fail with `NotFound`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown ID; store failures.
    pub async fn require_id(&self, id: &str) -> Result<Document, DatabaseError> {
        self.db
            .get(id)
            .await?
            .ok_or_else(|| CoreError::not_found("document", id).into())
    }

    /// Fetch the document of a kind by name or fail with `NotFound`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown name; store failures.
    pub async fn require_named(
        &self,
        entity: EntityKind,
        name: &str,
    ) -> Result<Document, DatabaseError> {
        self.db
            .get_named(entity, name)
            .await?
            .ok_or_else(|| CoreError::not_found(entity.as_str(), name).into())
    }
}
