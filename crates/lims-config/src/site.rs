//! Public addresses of documents and attachments.

use lims_core::enums::EntityKind;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_url_base() -> String {
    String::from("http://localhost:8080")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Base URL the entity pages are served under.
    #[serde(default = "default_url_base")]
    pub url_base: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url_base: default_url_base(),
        }
    }
}

impl SiteConfig {
    /// Reject a base URL that is not absolute http(s).
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidValue` naming `site.url_base`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url_base.starts_with("http://") || self.url_base.starts_with("https://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                field: "site.url_base".into(),
                reason: format!("'{}' is not an http(s) URL", self.url_base),
            })
        }
    }

    fn base(&self) -> &str {
        self.url_base.trim_end_matches('/')
    }

    /// `<url_base>/<entity>/<name>`
    #[must_use]
    pub fn entity_url(&self, entity: EntityKind, name: &str) -> String {
        format!("{}/{entity}/{name}", self.base())
    }

    /// `<url_base>/<entity>/<name>/<filename>`
    #[must_use]
    pub fn attachment_url(&self, entity: EntityKind, name: &str, filename: &str) -> String {
        format!("{}/{filename}", self.entity_url(entity, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_ignore_trailing_slash() {
        let site = SiteConfig {
            url_base: "https://lims.example.org/".into(),
        };
        assert_eq!(
            site.entity_url(EntityKind::Sample, "s1"),
            "https://lims.example.org/sample/s1"
        );
        assert_eq!(
            site.attachment_url(EntityKind::Project, "P1", "report.pdf"),
            "https://lims.example.org/project/P1/report.pdf"
        );
    }

    #[test]
    fn default_is_valid() {
        SiteConfig::default().validate().unwrap();
    }

    #[test]
    fn relative_base_is_rejected() {
        let site = SiteConfig {
            url_base: "lims.example.org".into(),
        };
        assert!(matches!(
            site.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "site.url_base"
        ));
    }
}
