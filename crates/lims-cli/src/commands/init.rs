use std::path::PathBuf;

use anyhow::Context;
use lims_config::PROJECT_DIR;
use lims_db::service::LimsService;
use serde::Serialize;

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::cli::root_commands::InitArgs;
use crate::context::PASSWORD_ENV;
use crate::output::output;

#[derive(Debug, Serialize)]
struct InitResponse {
    project_root: String,
    store: String,
    account: String,
    role: String,
}

/// Handle `lims init`.
pub async fn handle(args: &InitArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let project_root = match &flags.project {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    std::fs::create_dir_all(project_root.join(PROJECT_DIR))
        .with_context(|| format!("failed to create {PROJECT_DIR} in {}", project_root.display()))?;

    let password = match &args.password {
        Some(password) => password.clone(),
        None => std::env::var(PASSWORD_ENV)
            .with_context(|| format!("no admin password given (use --password or {PASSWORD_ENV})"))?,
    };

    let config = bootstrap::load_config(&project_root)?;
    let service = LimsService::open(&config, &project_root)
        .await
        .context("failed to open the lims store")?;
    if service.has_accounts().await? {
        anyhow::bail!(
            "{} is already initialized",
            config.database_path(&project_root).display()
        );
    }
    let admin = service.bootstrap_admin(&args.admin, &password).await?;
    tracing::info!(account = %admin.name, "initialized store");

    output(
        &InitResponse {
            project_root: project_root.display().to_string(),
            store: config.database_path(&project_root).display().to_string(),
            account: admin.name,
            role: admin.role.to_string(),
        },
        flags.format,
    )
}
