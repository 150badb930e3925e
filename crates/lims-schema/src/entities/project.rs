use lims_core::entities::Document;
use lims_core::enums::EntityKind;
use lims_core::identity::Actor;

use super::{EntitySchema, IndexSpec, NAME_INDEX, STANDARD_ACTIONS, TAG_INDEX};
use crate::field::{FieldKind, FieldSpec};
use crate::policy::{self, Ownership, Visibility};

/// Managers, or the project's operator.
fn editable(actor: &Actor, doc: &Document) -> bool {
    actor.role.is_manager() || doc.get_str("operator") == Some(actor.name.as_str())
}

static FIELDS: [FieldSpec; 10] = [
    FieldSpec::new("name", FieldKind::Name)
        .required()
        .fixed()
        .describe("Unique project name. Set at creation and cannot be changed."),
    FieldSpec::new("description", FieldKind::Text).describe("Explanation, comments."),
    FieldSpec::new("customer", FieldKind::Reference(EntityKind::Account))
        .required()
        .describe("The customer is usually the principal investigator of the project."),
    FieldSpec::new("operator", FieldKind::Reference(EntityKind::Account))
        .required()
        .default_login()
        .describe("The engineer responsible for overseeing this project."),
    FieldSpec::new("reference", FieldKind::String).describe(
        "Reference for the project, e.g. species or genome. \
         Samples created within the project get this reference by default.",
    ),
    FieldSpec::new("approved", FieldKind::Boolean)
        .describe("Has been approved by the review committee."),
    FieldSpec::new("started", FieldKind::Boolean).describe("Go-ahead has been given for work."),
    FieldSpec::new("finished", FieldKind::Boolean).describe("Work has been finalized."),
    FieldSpec::new("archived", FieldKind::Boolean)
        .describe("Samples and results are no longer directly available."),
    FieldSpec::new("results", FieldKind::String)
        .describe("Pointer to where the results can be found."),
];

pub static PROJECT: EntitySchema = EntitySchema {
    kind: EntityKind::Project,
    description: "A set of samples to be analysed using a particular experimental \
                  strategy. The samples belong to this and only this project.",
    fields: &FIELDS,
    indexes: &[
        NAME_INDEX,
        TAG_INDEX,
        IndexSpec::new("customer", "customer"),
        IndexSpec::new("operator", "operator"),
    ],
    visibility: Visibility::StaffOrOwner(Ownership::Field("customer")),
    editable,
    creatable: policy::managers,
    setup: None,
    before_save: None,
    actions: STANDARD_ACTIONS,
};
