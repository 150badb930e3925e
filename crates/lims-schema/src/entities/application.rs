use lims_core::enums::EntityKind;

use super::{EntitySchema, NAME_INDEX, STANDARD_ACTIONS, TAG_INDEX};
use crate::field::{FieldKind, FieldSpec};
use crate::policy::{self, Visibility};

static FIELDS: [FieldSpec; 3] = [
    FieldSpec::new("name", FieldKind::Name)
        .required()
        .fixed()
        .describe("Unique application identifier. Cannot be changed once set."),
    FieldSpec::new("label", FieldKind::String).describe("Human-readable label."),
    FieldSpec::new("description", FieldKind::Text),
];

pub static APPLICATION: EntitySchema = EntitySchema {
    kind: EntityKind::Application,
    description: "An experimental strategy, such as resequencing or RNA-seq.",
    fields: &FIELDS,
    indexes: &[NAME_INDEX, TAG_INDEX],
    visibility: Visibility::Staff,
    editable: policy::admins_edit,
    creatable: policy::managers,
    setup: None,
    before_save: None,
    actions: STANDARD_ACTIONS,
};
