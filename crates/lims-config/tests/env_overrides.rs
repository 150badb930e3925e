use std::path::Path;

use figment::Jail;
use lims_config::LimsConfig;
use pretty_assertions::assert_eq;

#[test]
fn full_env_provider_chain() {
    Jail::expect_with(|jail| {
        jail.set_env("LIMS_STORE__PATH", ":memory:");
        jail.set_env("LIMS_SITE__URL_BASE", "https://jail.example.org");
        jail.set_env("LIMS_AUTH__ACCOUNT", "anna");
        jail.set_env("LIMS_AUTH__PASSWORD", "jail-secret");
        jail.set_env("LIMS_GENERAL__DEFAULT_LIMIT", "42");

        let config = LimsConfig::load(Path::new(".")).map_err(|e| e.to_string())?;

        assert!(config.store.is_memory());
        assert_eq!(config.site.url_base, "https://jail.example.org");
        assert_eq!(config.auth.account, "anna");
        assert_eq!(config.auth.password, "jail-secret");
        assert!(config.auth.is_configured());
        assert_eq!(config.general.default_limit, 42);
        Ok(())
    });
}

#[test]
fn dotenv_file_in_project_dir_is_loaded() {
    Jail::expect_with(|jail| {
        jail.create_file(".env", "LIMS_AUTH__ACCOUNT=from-dotenv\n")?;

        let config = LimsConfig::load_with_dotenv(Path::new(".")).map_err(|e| e.to_string())?;
        assert_eq!(config.auth.account, "from-dotenv");
        Ok(())
    });
}
