//! # lims-config
//!
//! Layered configuration loading for the sample tracker using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`LIMS_*` prefix, `__` as separator)
//! 2. Project-level `.lims/config.toml`
//! 3. User-level `~/.config/lims/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `LIMS_STORE__PATH` -> `store.path`, `LIMS_AUTH__ACCOUNT` -> `auth.account`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use lims_config::LimsConfig;
//!
//! let config = LimsConfig::load_with_dotenv(std::path::Path::new(".")).expect("config");
//! println!("{}", config.site.entity_url(lims_core::enums::EntityKind::Sample, "s1"));
//! ```

mod auth;
mod error;
mod general;
mod site;
mod store;

pub use auth::AuthConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use site::SiteConfig;
pub use store::{MEMORY_PATH, StoreConfig};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding the project-local config and database.
pub const PROJECT_DIR: &str = ".lims";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LimsConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl LimsConfig {
    /// Load configuration for the project rooted at `project_dir`.
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need `.env` file loading.
    ///
    /// # Errors
    ///
    /// `ConfigError::Figment` on malformed sources, `ConfigError::InvalidValue`
    /// when a loaded value is unusable.
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(project_dir).extract()?;
        config.site.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// Reads `<project_dir>/.env`, falling back to a `.env` in the current
    /// directory, before building the figment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv(project_dir: &Path) -> Result<Self, ConfigError> {
        let env_path = project_dir.join(".env");
        if env_path.exists() {
            let _ = dotenvy::from_path(&env_path);
        } else {
            let _ = dotenvy::dotenv();
        }
        Self::load(project_dir)
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    #[must_use]
    pub fn figment(project_dir: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = Self::project_config_path(project_dir);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("LIMS_").split("__"))
    }

    /// Path of the project-local config file.
    #[must_use]
    pub fn project_config_path(project_dir: &Path) -> PathBuf {
        project_dir.join(PROJECT_DIR).join("config.toml")
    }

    /// Database path resolved against the project directory.
    #[must_use]
    pub fn database_path(&self, project_dir: &Path) -> PathBuf {
        self.store.resolve(project_dir)
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lims").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config = LimsConfig::default();
        assert!(!config.auth.is_configured());
        assert_eq!(config.store.path, ".lims/lims.db");
        assert_eq!(config.site.url_base, "http://localhost:8080");
    }

    #[test]
    fn figment_builds_without_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let config: LimsConfig = LimsConfig::figment(dir.path())
            .extract()
            .expect("should extract defaults");
        assert_eq!(config.general.default_limit, 20);
    }
}
