//! Credentials of the acting account.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Account name requests run as.
    #[serde(default)]
    pub account: String,

    /// Plaintext password, checked against the stored digest.
    #[serde(default)]
    pub password: String,
}

impl AuthConfig {
    /// Check if both account and password are set.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.account.is_empty() && !self.password.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        assert!(!AuthConfig::default().is_configured());
    }

    #[test]
    fn not_configured_without_password() {
        let config = AuthConfig {
            account: "alice".into(),
            ..Default::default()
        };
        assert!(!config.is_configured());
    }
}
