use lims_core::enums::EntityKind;

use super::{EntitySchema, IndexSpec, NAME_INDEX, STANDARD_ACTIONS, TAG_INDEX};
use crate::field::{FieldKind, FieldSpec};
use crate::policy::{self, Visibility};

static FIELDS: [FieldSpec; 8] = [
    FieldSpec::new("name", FieldKind::Name)
        .required()
        .fixed()
        .describe("Unique task identifier. Cannot be changed once set."),
    FieldSpec::new("altname", FieldKind::String).describe("Alternative name of the task."),
    FieldSpec::new("protocol", FieldKind::Reference(EntityKind::Protocol))
        .required()
        .fixed()
        .describe("The protocol applied. Cannot be changed once set."),
    FieldSpec::new("workset", FieldKind::Reference(EntityKind::Workset))
        .fixed()
        .describe("The workset the protocol is applied to. Cannot be changed once set."),
    FieldSpec::new("instrument", FieldKind::Reference(EntityKind::Instrument))
        .describe("Instrument used for the task."),
    FieldSpec::new("aux_unit", FieldKind::String)
        .describe("Auxiliary unit of the instrument, such as a flow cell."),
    FieldSpec::new("operator", FieldKind::Reference(EntityKind::Account))
        .required()
        .default_login()
        .describe("The user responsible for this task."),
    FieldSpec::new("description", FieldKind::Text),
];

pub static TASK: EntitySchema = EntitySchema {
    kind: EntityKind::Task,
    description: "An application of a protocol to a workset of samples.",
    fields: &FIELDS,
    indexes: &[
        NAME_INDEX,
        TAG_INDEX,
        IndexSpec::new("operator", "operator"),
        IndexSpec::new("protocol", "protocol"),
        IndexSpec::new("workset", "workset"),
    ],
    visibility: Visibility::Staff,
    editable: policy::staff_edit,
    creatable: policy::staff,
    setup: None,
    before_save: None,
    actions: STANDARD_ACTIONS,
};
