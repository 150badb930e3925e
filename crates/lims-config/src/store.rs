//! Document store location.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Path understood by libSQL as a transient in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

fn default_path() -> String {
    String::from(".lims/lims.db")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Database file, relative to the project directory unless absolute.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.path == MEMORY_PATH
    }

    /// Database path resolved against the project directory.
    #[must_use]
    pub fn resolve(&self, project_dir: &Path) -> PathBuf {
        let path = Path::new(&self.path);
        if self.is_memory() || path.is_absolute() {
            path.to_path_buf()
        } else {
            project_dir.join(path)
        }
    }
}
