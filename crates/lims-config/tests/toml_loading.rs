//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var manipulation.

use std::path::Path;

use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use lims_config::{ConfigError, LimsConfig};
use pretty_assertions::assert_eq;

#[test]
fn loads_full_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[store]
path = "/var/lib/lims/lims.db"

[site]
url_base = "https://lims.example.org"

[auth]
account = "per"
password = "secret"

[general]
default_limit = 50
"#,
        )?;

        let config: LimsConfig = Figment::from(Serialized::defaults(LimsConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.store.path, "/var/lib/lims/lims.db");
        assert_eq!(config.site.url_base, "https://lims.example.org");
        assert!(config.auth.is_configured());
        assert_eq!(config.general.default_limit, 50);
        Ok(())
    });
}

#[test]
fn partial_section_keeps_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[auth]\naccount = \"per\"\n")?;

        let config: LimsConfig = Figment::from(Serialized::defaults(LimsConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.auth.account, "per");
        assert!(config.auth.password.is_empty());
        assert_eq!(config.store.path, ".lims/lims.db");
        assert_eq!(config.general.default_limit, 20);
        Ok(())
    });
}

#[test]
fn project_config_is_read_from_project_dir() {
    Jail::expect_with(|jail| {
        std::fs::create_dir_all(".lims").map_err(|e| e.to_string())?;
        jail.create_file(
            ".lims/config.toml",
            "[site]\nurl_base = \"https://lab.example.org\"\n",
        )?;

        let config = LimsConfig::load(Path::new(".")).map_err(|e| e.to_string())?;
        assert_eq!(config.site.url_base, "https://lab.example.org");
        Ok(())
    });
}

#[test]
fn invalid_url_base_is_rejected_on_load() {
    Jail::expect_with(|jail| {
        jail.set_env("LIMS_SITE__URL_BASE", "lab.example.org");

        let result = LimsConfig::load(Path::new("."));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        Ok(())
    });
}

#[test]
fn env_var_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.set_env("LIMS_STORE__PATH", "from-env.db");

        jail.create_file(
            "config.toml",
            r#"
[store]
path = "from-toml.db"

[auth]
account = "toml-account"
"#,
        )?;

        let config: LimsConfig = Figment::from(Serialized::defaults(LimsConfig::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("LIMS_").split("__"))
            .extract()?;

        // Env should win over TOML
        assert_eq!(config.store.path, "from-env.db");
        // TOML value not overridden by env should remain
        assert_eq!(config.auth.account, "toml-account");
        Ok(())
    });
}

/// Typo'd env var keys are silently ignored by figment.
#[test]
fn typo_env_var_silently_ignored() {
    Jail::expect_with(|jail| {
        jail.set_env("LIMS_STORE__PATHH", "typo.db");

        let config: LimsConfig = Figment::from(Serialized::defaults(LimsConfig::default()))
            .merge(Env::prefixed("LIMS_").split("__"))
            .extract()?;

        assert_eq!(config.store.path, ".lims/lims.db");
        Ok(())
    });
}
