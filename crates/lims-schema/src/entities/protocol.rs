use lims_core::enums::EntityKind;

use super::{EntitySchema, IndexSpec, NAME_INDEX, STANDARD_ACTIONS, TAG_INDEX};
use crate::field::{FieldKind, FieldSpec};
use crate::policy::{self, Visibility};

static FIELDS: [FieldSpec; 5] = [
    FieldSpec::new("name", FieldKind::Name)
        .required()
        .fixed()
        .describe("Unique protocol identifier. Cannot be changed once set."),
    FieldSpec::new("steps", FieldKind::Steps)
        .required()
        .describe("The steps of the protocol, one per line."),
    FieldSpec::new("applications", FieldKind::ReferenceList(EntityKind::Application))
        .describe("Applications the protocol is used for."),
    FieldSpec::new("instruments", FieldKind::ReferenceList(EntityKind::Instrument))
        .describe("Instruments the protocol may be run on."),
    FieldSpec::new("description", FieldKind::Text),
];

pub static PROTOCOL: EntitySchema = EntitySchema {
    kind: EntityKind::Protocol,
    description: "A procedure defined as a sequence of steps. It may be associated \
                  with any number of applications and instruments.",
    fields: &FIELDS,
    indexes: &[
        NAME_INDEX,
        TAG_INDEX,
        IndexSpec::new("instrument", "instruments"),
        IndexSpec::new("application", "applications"),
    ],
    visibility: Visibility::Staff,
    editable: policy::managers_edit,
    creatable: policy::managers,
    setup: None,
    before_save: None,
    actions: STANDARD_ACTIONS,
};
