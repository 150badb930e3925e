use std::path::Path;

use anyhow::Context;
use lims_config::LimsConfig;
use lims_core::identity::Actor;
use lims_db::service::LimsService;

use crate::cli::GlobalFlags;

/// Environment variable holding the password of the acting account.
pub const PASSWORD_ENV: &str = "LIMS_PASSWORD";

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: LimsService,
    pub config: LimsConfig,
    /// The authenticated account every command acts as.
    pub actor: Actor,
}

impl AppContext {
    /// Open the project store and authenticate the acting account.
    pub async fn init(
        project_root: &Path,
        config: LimsConfig,
        flags: &GlobalFlags,
    ) -> anyhow::Result<Self> {
        let service = LimsService::open(&config, project_root)
            .await
            .context("failed to open the lims store")?;

        let (account, password) = credentials(flags.account.as_deref(), &config)?;
        let actor = service
            .authenticate(&account, &password)
            .await
            .with_context(|| format!("cannot act as '{account}'"))?;
        tracing::debug!(account = %actor.name, role = %actor.role, "authenticated");

        Ok(Self {
            service,
            config,
            actor,
        })
    }
}

/// Account name and password: `--account` over `auth.account`, and
/// `LIMS_PASSWORD` over `auth.password`.
pub fn credentials(account: Option<&str>, config: &LimsConfig) -> anyhow::Result<(String, String)> {
    let account = account
        .map(str::to_string)
        .or_else(|| Some(config.auth.account.clone()).filter(|name| !name.is_empty()))
        .context("no account given (use --account, LIMS_ACCOUNT or auth.account)")?;
    let password = std::env::var(PASSWORD_ENV)
        .ok()
        .or_else(|| Some(config.auth.password.clone()).filter(|password| !password.is_empty()))
        .with_context(|| format!("no password given for '{account}' (set {PASSWORD_ENV} or auth.password)"))?;
    Ok((account, password))
}
