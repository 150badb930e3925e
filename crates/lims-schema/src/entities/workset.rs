use std::collections::BTreeSet;

use lims_core::entities::Document;
use lims_core::enums::EntityKind;
use lims_core::grid::Grid;

use super::{EntitySchema, IndexSpec, NAME_INDEX, STANDARD_ACTIONS, TAG_INDEX};
use crate::field::{FieldKind, FieldSpec};
use crate::policy::{self, Visibility};

/// Drop grid placements of samples no longer in the set.
fn cleanup_arrangement(doc: &mut Document) {
    let members: BTreeSet<String> = doc.get_strings("samples").into_iter().collect();
    let mut grid = Grid::from_value(doc.get("grid"));
    let Some(arrangement) = grid.arrangement.as_mut() else {
        return;
    };
    let before = arrangement.clone();
    arrangement.retain(|sample| members.contains(sample));
    if *arrangement != before {
        doc.set("grid", grid.to_value());
    }
}

static FIELDS: [FieldSpec; 5] = [
    FieldSpec::new("name", FieldKind::Name)
        .required()
        .fixed()
        .describe("Unique workset identifier. Cannot be changed once set."),
    FieldSpec::new("description", FieldKind::Text),
    FieldSpec::new("operator", FieldKind::Reference(EntityKind::Account))
        .required()
        .default_login()
        .describe("The user responsible for this workset."),
    FieldSpec::new("samples", FieldKind::SampleSet { grid: Some("grid") })
        .describe("The set of samples."),
    FieldSpec::new("grid", FieldKind::SampleGrid { samples: "samples" }).describe(
        "Arrangement of the samples in a grid of specified dimensions. All \
         dimension sizes must be positive integers for the grid to be defined. \
         Shrinking a dimension may implicitly remove samples from the arrangement.",
    ),
];

pub static WORKSET: EntitySchema = EntitySchema {
    kind: EntityKind::Workset,
    description: "A collection of samples to be handled together, for example by \
                  a task. It may contain samples from different projects, samples \
                  may be added or removed, and a sample may be part of any number \
                  of worksets. The samples may be arranged in a grid of rows, \
                  columns and multiplex slots.",
    fields: &FIELDS,
    indexes: &[
        NAME_INDEX,
        TAG_INDEX,
        IndexSpec::new("operator", "operator"),
        IndexSpec::new("sample", "samples"),
    ],
    visibility: Visibility::Staff,
    editable: policy::staff_edit,
    creatable: policy::staff,
    setup: None,
    before_save: Some(cleanup_arrangement),
    actions: STANDARD_ACTIONS,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::stored;
    use serde_json::json;

    #[test]
    fn removed_members_leave_the_grid() {
        let mut doc = stored(
            EntityKind::Workset,
            "w1",
            json!({
                "samples": ["s1"],
                "grid": {"rows": 1, "columns": 2, "multiplex": 1, "arrangement": [[["s1"], ["s2"]]]}
            }),
        );
        cleanup_arrangement(&mut doc);
        let grid = Grid::from_value(doc.get("grid"));
        let arrangement = grid.arrangement.unwrap();
        assert_eq!(arrangement.get(0, 0, 0), Some("s1"));
        assert_eq!(arrangement.get(0, 1, 0), None);
    }

    #[test]
    fn undefined_grid_is_left_alone() {
        let mut doc = stored(EntityKind::Workset, "w1", json!({"samples": []}));
        cleanup_arrangement(&mut doc);
        assert!(doc.get("grid").is_none());
    }
}
