use lims_core::entities::Document;
use lims_core::enums::EntityKind;

use super::{EntitySchema, IndexSpec, NAME_INDEX, STANDARD_ACTIONS, TAG_INDEX};
use crate::field::{FieldKind, FieldSpec, StatusSpec};
use crate::kinds::StatusEntry;
use crate::kinds::status::entries;
use crate::policy::{self, Ownership, Visibility};

const YES: &[&str] = &["yes"];

const STATUSES: &[StatusSpec] = &[
    StatusSpec {
        name: "defined",
        values: YES,
        description: "Defined in this system.",
    },
    StatusSpec {
        name: "available",
        values: YES,
        description: "Received or created.",
    },
    StatusSpec {
        name: "finished",
        values: YES,
        description: "No more work to be done.",
    },
    StatusSpec {
        name: "returned",
        values: YES,
        description: "Returned to customer.",
    },
    StatusSpec {
        name: "scrapped",
        values: YES,
        description: "Useless for any further work.",
    },
];

/// New samples start out defined, whatever other status was submitted.
fn setup(doc: &mut Document) {
    let mut status = entries(doc.get("status"));
    if status.iter().any(|entry| entry.name == "defined") {
        return;
    }
    status.insert(0, StatusEntry::now("defined", "yes"));
    if let Ok(value) = serde_json::to_value(status) {
        doc.set("status", value);
    }
}

static FIELDS: [FieldSpec; 12] = [
    FieldSpec::new("name", FieldKind::Name)
        .required()
        .fixed()
        .describe("Unique sample identifier. Cannot be changed once set."),
    FieldSpec::new("altname", FieldKind::String)
        .describe("Alternative name, such as the customer's name for the sample."),
    FieldSpec::new("project", FieldKind::Reference(EntityKind::Project))
        .required()
        .describe("Project of the sample."),
    FieldSpec::new("reference", FieldKind::String)
        .describe("Reference genome or species for the sample."),
    FieldSpec::new("parent", FieldKind::Reference(EntityKind::Sample))
        .fixed()
        .describe("Sample from which this was derived. Cannot be changed once set."),
    FieldSpec::new("amount", FieldKind::Float),
    FieldSpec::new("concentration", FieldKind::Float),
    FieldSpec::new("location", FieldKind::String).describe("Physical location of the sample."),
    FieldSpec::new("status", FieldKind::Status(STATUSES)).describe("Status flags for the sample."),
    FieldSpec::new("multiplex_label", FieldKind::String)
        .describe("Label representing the multiplexing sequence."),
    FieldSpec::new("multiplex_sequence", FieldKind::String)
        .describe("Actual multiplexing sequence. Overrides the label when defined."),
    FieldSpec::new("description", FieldKind::Text),
];

pub static SAMPLE: EntitySchema = EntitySchema {
    kind: EntityKind::Sample,
    description: "A finite amount of material to be analysed. It is always part of \
                  one and only one project, and may be a member of any number of \
                  worksets.",
    fields: &FIELDS,
    indexes: &[
        NAME_INDEX,
        TAG_INDEX,
        IndexSpec::new("project", "project"),
        IndexSpec::new("altname", "altname"),
    ],
    visibility: Visibility::StaffOrOwner(Ownership::Referenced {
        via: "project",
        entity: EntityKind::Project,
        owner: "customer",
    }),
    editable: policy::staff_edit,
    creatable: policy::staff,
    setup: Some(setup),
    before_save: None,
    actions: STANDARD_ACTIONS,
};
