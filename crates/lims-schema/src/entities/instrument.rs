use lims_core::enums::EntityKind;

use super::{EntitySchema, NAME_INDEX, STANDARD_ACTIONS, TAG_INDEX};
use crate::field::{FieldKind, FieldSpec};
use crate::policy::{self, Visibility};

static FIELDS: [FieldSpec; 7] = [
    FieldSpec::new("name", FieldKind::Name)
        .required()
        .fixed()
        .describe("Unique instrument identifier. Cannot be changed once set."),
    FieldSpec::new("label", FieldKind::String).describe("Human-readable label."),
    FieldSpec::new("type", FieldKind::String)
        .required()
        .describe("Instrument type, such as the manufacturer's model."),
    FieldSpec::new("max_rows", FieldKind::Integer)
        .required()
        .default_value("1")
        .describe("Maximum number of rows in a workset grid."),
    FieldSpec::new("max_columns", FieldKind::Integer)
        .required()
        .default_value("1")
        .describe("Maximum number of columns in a workset grid."),
    FieldSpec::new("max_multiplex", FieldKind::Integer)
        .required()
        .default_value("1")
        .describe("Maximum multiplex of a workset grid cell."),
    FieldSpec::new("description", FieldKind::Text),
];

pub static INSTRUMENT: EntitySchema = EntitySchema {
    kind: EntityKind::Instrument,
    description: "A machine on which protocols are run.",
    fields: &FIELDS,
    indexes: &[NAME_INDEX, TAG_INDEX],
    visibility: Visibility::Staff,
    editable: policy::admins_edit,
    creatable: policy::managers,
    setup: None,
    before_save: None,
    actions: STANDARD_ACTIONS,
};
