use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Role;

/// Name recorded in the log for mutations made before any account exists.
pub const SYSTEM_ACCOUNT: &str = "system";

/// The authenticated account on whose behalf a request runs.
///
/// Resolved once per request from the account document. Carries no
/// credentials.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Actor {
    /// Document ID of the account.
    pub id: String,
    /// Account name, recorded in log entries.
    pub name: String,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }

    /// Pseudo-actor used while bootstrapping the first admin account.
    #[must_use]
    pub fn system() -> Self {
        Self::new(SYSTEM_ACCOUNT, SYSTEM_ACCOUNT, Role::Admin)
    }

    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}
