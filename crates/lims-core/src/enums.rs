//! Roles and entity kinds.
//!
//! Both enums serialize in lowercase `snake_case` and round-trip through
//! `as_str` / `FromStr`, which is how they are stored and how they appear on
//! the command line.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Access privilege role of an account.
///
/// `Admin` ⊇ `Manager` ⊇ `Engineer` form the staff hierarchy. `Customer`
/// is outside it and only sees documents it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Engineer,
    Manager,
    Admin,
}

impl Role {
    pub const ALL: [Self; 4] = [Self::Customer, Self::Engineer, Self::Manager, Self::Admin];

    /// Stored names, in privilege order.
    pub const NAMES: &'static [&'static str] = &["customer", "engineer", "manager", "admin"];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Engineer => "engineer",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Engineer, manager or admin.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        !matches!(self, Self::Customer)
    }

    /// Manager or admin.
    #[must_use]
    pub const fn is_manager(self) -> bool {
        matches!(self, Self::Manager | Self::Admin)
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// Tag selecting which entity schema governs a document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Account,
    Project,
    Sample,
    Workset,
    Protocol,
    Task,
    Instrument,
    Application,
}

impl EntityKind {
    pub const ALL: [Self; 8] = [
        Self::Account,
        Self::Project,
        Self::Sample,
        Self::Workset,
        Self::Protocol,
        Self::Task,
        Self::Instrument,
        Self::Application,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Project => "project",
            Self::Sample => "sample",
            Self::Workset => "workset",
            Self::Protocol => "protocol",
            Self::Task => "task",
            Self::Instrument => "instrument",
            Self::Application => "application",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown entity '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_hierarchy() {
        assert!(!Role::Customer.is_staff());
        assert!(Role::Engineer.is_staff());
        assert!(!Role::Engineer.is_manager());
        assert!(Role::Manager.is_manager());
        assert!(!Role::Manager.is_admin());
        assert!(Role::Admin.is_staff() && Role::Admin.is_manager() && Role::Admin.is_admin());
    }

    #[test]
    fn entity_kind_string_roundtrip() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>(), Ok(kind));
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.to_string()));
        }
        assert!("log".parse::<EntityKind>().is_err());
    }

    #[test]
    fn role_parse_rejects_unknown() {
        assert_eq!("manager".parse::<Role>(), Ok(Role::Manager));
        assert_eq!(
            "root".parse::<Role>(),
            Err(String::from("unknown role 'root'"))
        );
    }

    #[test]
    fn role_names_follow_variants() {
        let names: Vec<&str> = Role::ALL.iter().map(|role| role.as_str()).collect();
        assert_eq!(names, Role::NAMES);
    }
}
