use std::path::{Path, PathBuf};

use anyhow::Context;
use lims_config::{LimsConfig, PROJECT_DIR};

/// Load configuration for the project, reading its `.env` first.
pub fn load_config(project_root: &Path) -> anyhow::Result<LimsConfig> {
    LimsConfig::load_with_dotenv(project_root).context("failed to load configuration")
}

/// Project root from `--project`, or the nearest ancestor holding `.lims`.
pub fn resolve_project_root(project_override: Option<&str>) -> anyhow::Result<PathBuf> {
    if let Some(path) = project_override {
        let explicit = PathBuf::from(path);

        if explicit
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == PROJECT_DIR)
        {
            return explicit
                .parent()
                .map(Path::to_path_buf)
                .context("invalid --project path: '.lims' directory has no parent");
        }

        if explicit.is_dir() {
            return Ok(explicit);
        }

        anyhow::bail!(
            "invalid --project '{}': directory does not exist",
            explicit.display()
        );
    }

    let start = std::env::current_dir().context("failed to read current directory")?;
    find_project_root(&start)
        .context("not a lims project (no .lims directory found). Run 'lims init' first.")
}

/// Walk upwards from `start` until a `.lims` directory is found.
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(PROJECT_DIR).is_dir() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}
