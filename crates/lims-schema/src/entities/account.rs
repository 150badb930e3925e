use lims_core::entities::Document;
use lims_core::enums::{EntityKind, Role};
use lims_core::identity::{Actor, SYSTEM_ACCOUNT};

use super::{EntitySchema, NAME_INDEX, STANDARD_ACTIONS, TAG_INDEX};
use crate::field::{FieldKind, FieldSpec};
use crate::policy::{self, Ownership, Visibility};

/// Admins edit any account and everyone edits their own; managers edit
/// engineer and customer accounts.
fn editable(actor: &Actor, doc: &Document) -> bool {
    if actor.role.is_admin() || doc.name() == Some(actor.name.as_str()) {
        return true;
    }
    actor.role.is_manager()
        && matches!(doc.get_str("role"), Some("engineer" | "customer"))
}

/// Only admins assign roles, and never on the system account.
fn role_editable(actor: &Actor, doc: Option<&Document>) -> bool {
    actor.role.is_admin() && doc.is_none_or(|doc| doc.name() != Some(SYSTEM_ACCOUNT))
}

static FIELDS: [FieldSpec; 8] = [
    FieldSpec::new("name", FieldKind::Name)
        .required()
        .fixed()
        .describe("Unique user account identifier. Cannot be changed once set."),
    FieldSpec::new("password", FieldKind::Password)
        .required()
        .describe("Account password."),
    FieldSpec::new("role", FieldKind::Option(Role::NAMES))
        .required()
        .default_value("customer")
        .editable_when(role_editable)
        .describe("Access privilege role."),
    FieldSpec::new("fullname", FieldKind::String)
        .describe("Full name as 'surname, given name'."),
    FieldSpec::new("initials", FieldKind::String).describe("Initials of the full name."),
    FieldSpec::new("address", FieldKind::Text),
    FieldSpec::new("email", FieldKind::String),
    FieldSpec::new("description", FieldKind::Text),
];

pub static ACCOUNT: EntitySchema = EntitySchema {
    kind: EntityKind::Account,
    description: "A user account. The role determines the access privileges: \
                  customers only see what they own, engineers edit samples and \
                  worksets, managers add accounts and edit most entities, admins \
                  may do anything.",
    fields: &FIELDS,
    indexes: &[NAME_INDEX, TAG_INDEX],
    visibility: Visibility::StaffOrOwner(Ownership::Field("name")),
    editable,
    creatable: policy::managers,
    setup: None,
    before_save: None,
    actions: STANDARD_ACTIONS,
};
