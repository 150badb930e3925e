//! Presentation descriptors.
//!
//! Views and edit controls are plain serializable data computed from the
//! stored value alone; turning them into HTML, a table or JSON is up to the
//! caller. An edit control knows which inputs an unmodified submission of it
//! would send, see [`FormControl::default_inputs`].

use std::collections::{BTreeMap, BTreeSet};

use lims_core::entities::Document;
use lims_core::enums::EntityKind;
use lims_core::grid::{Grid, grid_coordinate};
use lims_core::identity::Actor;
use serde::Serialize;
use serde_json::Value;

use crate::field::{FieldKind, FieldSpec, StatusSpec};
use crate::kinds::sample_grid::{cell_key, dimension_key};
use crate::kinds::scalar::value_to_input;
use crate::kinds::status::{StatusEntry, entries};
use crate::request::{NONE_SENTINEL, RequestValues};

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub field: &'static str,
    #[serde(flatten)]
    pub value: ViewValue,
}

/// A sample and where it sits in the sibling grid, e.g. `"B3.1"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub name: String,
    pub coordinate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridRow {
    pub label: String,
    pub cells: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewValue {
    Empty,
    Text { text: String },
    Lines { lines: Vec<String> },
    /// A value that is never shown, only acknowledged.
    Masked,
    Link { entity: EntityKind, name: String },
    Links { entity: EntityKind, names: Vec<String> },
    Statuses { entries: Vec<StatusEntry> },
    Samples { samples: Vec<Placement> },
    Grid { columns: Vec<String>, rows: Vec<GridRow> },
}

impl ViewValue {
    /// One-line rendering for tables.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text { text } => text.clone(),
            Self::Lines { lines } => lines.join("; "),
            Self::Masked => String::from("[hidden]"),
            Self::Link { name, .. } => name.clone(),
            Self::Links { names, .. } => names.join(", "),
            Self::Statuses { entries } => entries
                .iter()
                .map(|entry| format!("{}={}", entry.name, entry.value))
                .collect::<Vec<_>>()
                .join(", "),
            Self::Samples { samples } => samples
                .iter()
                .map(|placement| match &placement.coordinate {
                    Some(coordinate) => format!("{}@{coordinate}", placement.name),
                    None => placement.name.clone(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            Self::Grid { columns, rows } => format!("{}x{} grid", rows.len(), columns.len()),
        }
    }
}

// ---------------------------------------------------------------------------
// Edit controls
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    fn new(value: impl Into<String>, selected: bool) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
            selected,
        }
    }

    fn none(selected: bool) -> Self {
        Self {
            value: NONE_SENTINEL.to_string(),
            label: String::new(),
            selected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusControl {
    pub name: String,
    pub status: &'static str,
    pub description: &'static str,
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedValue {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCellControl {
    pub name: String,
    pub coordinate: String,
    pub selected: Vec<String>,
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum Widget {
    Input {
        name: String,
        value: String,
    },
    TextArea {
        name: String,
        value: String,
    },
    Select {
        name: String,
        options: Vec<SelectOption>,
    },
    /// Text input plus a `now` checkbox submitted under the same name.
    Timestamp {
        name: String,
        value: String,
    },
    Password {
        new: String,
        confirm: String,
    },
    ReferenceList {
        add: String,
        remove: String,
        current: Vec<String>,
        candidates: Vec<String>,
    },
    Status {
        statuses: Vec<StatusControl>,
    },
    SampleSet {
        add: String,
        project: String,
        workset: String,
        workset_remove: String,
        remove: String,
        current: Vec<String>,
    },
    SampleGrid {
        dimensions: Vec<NamedValue>,
        cells: Vec<GridCellControl>,
    },
    Static {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormControl {
    pub field: &'static str,
    pub kind: &'static str,
    pub required: bool,
    pub description: &'static str,
    #[serde(flatten)]
    pub widget: Widget,
}

impl FormControl {
    /// Inputs an unmodified submission of this control sends.
    #[must_use]
    pub fn default_inputs(&self) -> RequestValues {
        let mut values = RequestValues::new();
        match &self.widget {
            Widget::Input { name, value }
            | Widget::TextArea { name, value }
            | Widget::Timestamp { name, value } => values.insert(name.clone(), value.clone()),
            Widget::Select { name, options } => {
                for option in options.iter().filter(|option| option.selected) {
                    values.insert(name.clone(), option.value.clone());
                }
            }
            Widget::Status { statuses } => {
                for control in statuses {
                    for option in control.options.iter().filter(|option| option.selected) {
                        values.insert(control.name.clone(), option.value.clone());
                    }
                }
            }
            Widget::SampleGrid { dimensions, cells } => {
                for dimension in dimensions {
                    values.insert(dimension.name.clone(), dimension.value.clone());
                }
                for cell in cells {
                    for sample in &cell.selected {
                        values.insert(cell.name.clone(), sample.clone());
                    }
                }
            }
            Widget::Password { .. }
            | Widget::ReferenceList { .. }
            | Widget::SampleSet { .. }
            | Widget::Static { .. } => {}
        }
        values
    }
}

/// Names currently available for reference selections, per entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormChoices {
    pub names: BTreeMap<EntityKind, Vec<String>>,
}

impl FormChoices {
    #[must_use]
    pub fn names(&self, kind: EntityKind) -> &[String] {
        self.names.get(&kind).map_or(&[], Vec::as_slice)
    }
}

/// An assembled form: one field of an existing document, or all fields of a
/// new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityForm {
    pub entity: EntityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Revision the form was rendered at; submit it back as the expected
    /// revision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    pub controls: Vec<FormControl>,
}

// ---------------------------------------------------------------------------
// FieldSpec rendering
// ---------------------------------------------------------------------------

impl FieldSpec {
    /// Kind whose name index feeds this field's selection, if any.
    #[must_use]
    pub const fn referenced_kind(&self) -> Option<EntityKind> {
        match self.kind {
            FieldKind::Reference(kind) | FieldKind::ReferenceList(kind) => Some(kind),
            _ => None,
        }
    }

    #[must_use]
    pub fn render_view(&self, doc: &Document) -> FieldView {
        let stored = doc.get(self.name);
        let value = match (self.kind, stored) {
            (_, None) => ViewValue::Empty,
            (FieldKind::Password, Some(_)) => ViewValue::Masked,
            (FieldKind::Reference(entity), Some(Value::String(name))) => ViewValue::Link {
                entity,
                name: name.clone(),
            },
            (FieldKind::ReferenceList(entity), Some(_)) => ViewValue::Links {
                entity,
                names: doc.get_strings(self.name),
            },
            (FieldKind::Status(_), Some(_)) => ViewValue::Statuses {
                entries: entries(stored),
            },
            (FieldKind::SampleSet { grid }, Some(_)) => ViewValue::Samples {
                samples: placements(doc, self.name, grid),
            },
            (FieldKind::SampleGrid { .. }, Some(_)) => grid_view(stored),
            (FieldKind::Steps, Some(_)) => ViewValue::Lines {
                lines: doc.get_strings(self.name),
            },
            _ => ViewValue::Text {
                text: value_to_input(self, stored),
            },
        };
        FieldView {
            field: self.name,
            value,
        }
    }

    /// Form descriptor for this field; `doc` is `None` on create.
    #[must_use]
    pub fn render_edit_control(
        &self,
        doc: Option<&Document>,
        actor: &Actor,
        choices: &FormChoices,
    ) -> FormControl {
        let stored = doc.and_then(|doc| doc.get(self.name));
        let initial = match doc {
            Some(_) => value_to_input(self, stored),
            None => self.default_input(actor).unwrap_or_default(),
        };
        let name = self.name.to_string();
        let widget = match self.kind {
            FieldKind::Text | FieldKind::Steps => Widget::TextArea {
                name,
                value: initial,
            },
            FieldKind::Timestamp => Widget::Timestamp {
                name,
                value: initial,
            },
            FieldKind::Option(options) => Widget::Select {
                options: self.select_options(options.iter().copied(), &initial),
                name,
            },
            FieldKind::Boolean => Widget::Select {
                options: self.select_options(["false", "true"], &initial),
                name,
            },
            FieldKind::Reference(kind) => Widget::Select {
                options: self.select_options(
                    choices.names(kind).iter().map(String::as_str),
                    &initial,
                ),
                name,
            },
            FieldKind::Password => Widget::Password {
                new: format!("new_{name}"),
                confirm: format!("confirm_{name}"),
            },
            FieldKind::ReferenceList(kind) => {
                let current = doc.map(|doc| doc.get_strings(self.name)).unwrap_or_default();
                let candidates = choices
                    .names(kind)
                    .iter()
                    .filter(|candidate| !current.contains(candidate))
                    .cloned()
                    .collect();
                Widget::ReferenceList {
                    add: format!("{name}_add"),
                    remove: format!("{name}_remove"),
                    current,
                    candidates,
                }
            }
            FieldKind::Status(statuses) => Widget::Status {
                statuses: status_controls(self.name, statuses, stored),
            },
            FieldKind::SampleSet { .. } => Widget::SampleSet {
                add: name.clone(),
                project: format!("{name}_project"),
                workset: format!("{name}_workset"),
                workset_remove: format!("{name}_workset_remove"),
                remove: format!("{name}_remove"),
                current: doc.map(|doc| doc.get_strings(self.name)).unwrap_or_default(),
            },
            FieldKind::SampleGrid { samples } => match doc {
                Some(doc) => grid_control(self.name, samples, doc),
                None => Widget::Static {
                    text: String::from("Initially undefined arrangement."),
                },
            },
            FieldKind::String
            | FieldKind::Integer
            | FieldKind::PositiveInteger
            | FieldKind::Float
            | FieldKind::Name => Widget::Input {
                name,
                value: initial,
            },
        };
        FormControl {
            field: self.name,
            kind: self.kind.as_str(),
            required: self.required,
            description: self.description,
            widget,
        }
    }

    fn select_options<'a>(
        &self,
        values: impl IntoIterator<Item = &'a str>,
        selected: &str,
    ) -> Vec<SelectOption> {
        let mut options = Vec::new();
        if !self.required {
            options.push(SelectOption::none(selected.is_empty()));
        }
        options.extend(
            values
                .into_iter()
                .map(|value| SelectOption::new(value, value == selected)),
        );
        options
    }
}

fn placements(doc: &Document, field: &str, grid: Option<&str>) -> Vec<Placement> {
    let arranged = grid
        .map(|grid| Grid::from_value(doc.get(grid)))
        .and_then(|grid| grid.arrangement)
        .map(|arrangement| arrangement.placements())
        .unwrap_or_default();
    doc.get_strings(field)
        .into_iter()
        .map(|name| Placement {
            coordinate: arranged
                .get(&name)
                .map(|&(row, column, slot)| grid_coordinate(Some(row), Some(column), Some(slot))),
            name,
        })
        .collect()
}

fn grid_view(stored: Option<&Value>) -> ViewValue {
    let grid = Grid::from_value(stored);
    let Some(arrangement) = grid.arrangement else {
        return ViewValue::Empty;
    };
    let dims = arrangement.dimensions();
    let columns = (0..dims.columns)
        .map(|column| grid_coordinate(None, Some(column), None))
        .collect();
    let rows = arrangement
        .to_nested()
        .into_iter()
        .enumerate()
        .map(|(row, cells)| GridRow {
            label: grid_coordinate(Some(row), None, None),
            cells,
        })
        .collect();
    ViewValue::Grid { columns, rows }
}

fn status_controls(
    field: &str,
    statuses: &[StatusSpec],
    stored: Option<&Value>,
) -> Vec<StatusControl> {
    let current = entries(stored);
    statuses
        .iter()
        .map(|status| {
            let value = current
                .iter()
                .find(|entry| entry.name == status.name)
                .map(|entry| entry.value.as_str());
            let mut options = vec![SelectOption::none(value.is_none())];
            options.extend(
                status
                    .values
                    .iter()
                    .map(|allowed| SelectOption::new(*allowed, value == Some(*allowed))),
            );
            StatusControl {
                name: format!("{field}_{}", status.name),
                status: status.name,
                description: status.description,
                options,
            }
        })
        .collect()
}

fn grid_control(field: &str, samples: &str, doc: &Document) -> Widget {
    let grid = Grid::from_value(doc.get(field));
    let dimension = |key: &str, size: Option<usize>| NamedValue {
        name: dimension_key(field, key),
        value: size.map(|size| size.to_string()).unwrap_or_default(),
    };
    let dimensions = vec![
        dimension("rows", grid.rows),
        dimension("columns", grid.columns),
        dimension("multiplex", grid.multiplex),
    ];
    let Some(arrangement) = grid.arrangement else {
        return Widget::SampleGrid {
            dimensions,
            cells: Vec::new(),
        };
    };
    let arranged: BTreeSet<String> = arrangement.placements().into_keys().collect();
    let unarranged: Vec<String> = doc
        .get_strings(samples)
        .into_iter()
        .filter(|sample| !arranged.contains(sample))
        .collect();
    let dims = arrangement.dimensions();
    let mut cells = Vec::with_capacity(dims.rows * dims.columns);
    for row in 0..dims.rows {
        for column in 0..dims.columns {
            cells.push(GridCellControl {
                name: cell_key(field, row, column),
                coordinate: grid_coordinate(Some(row), Some(column), None),
                selected: arrangement
                    .cell(row, column)
                    .iter()
                    .flatten()
                    .cloned()
                    .collect(),
                candidates: unarranged.clone(),
            });
        }
    }
    Widget::SampleGrid { dimensions, cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldContext, Parsed};
    use crate::test_support::{MemoryStore, actor, stored};
    use lims_core::enums::Role;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    /// Parse what an unmodified edit form submits.
    async fn resubmit(field: &FieldSpec, doc: &Document) -> Parsed {
        let store = MemoryStore::new();
        store.insert(stored(EntityKind::Account, "alice", json!({})));
        let actor = actor();
        let mut choices = FormChoices::default();
        choices.names.insert(EntityKind::Account, vec!["alice".into()]);
        let control = field.render_edit_control(Some(doc), &actor, &choices);
        let ctx = FieldContext::new(&store, &actor, doc.entity, Some(doc));
        field
            .parse_and_validate(&ctx, &control.default_inputs(), false)
            .await
            .unwrap()
    }

    #[rstest]
    #[case(FieldKind::String, json!("abc"))]
    #[case(FieldKind::Text, json!("line one\nline two"))]
    #[case(FieldKind::Integer, json!(-12))]
    #[case(FieldKind::Float, json!(0.25))]
    #[case(FieldKind::Float, json!(3.0))]
    #[case(FieldKind::Boolean, json!(true))]
    #[case(FieldKind::Boolean, json!(false))]
    #[case(FieldKind::Timestamp, json!("2011-02-09T09:23:34Z"))]
    #[case(FieldKind::Option(&["small", "large"]), json!("large"))]
    #[case(FieldKind::Reference(EntityKind::Account), json!("alice"))]
    #[case(FieldKind::Steps, json!(["mix", "spin"]))]
    #[tokio::test]
    async fn unmodified_form_reproduces_value(#[case] kind: FieldKind, #[case] value: Value) {
        let field = FieldSpec::new("f", kind);
        let doc = stored(EntityKind::Sample, "s1", json!({ "f": value.clone() }));
        assert_eq!(resubmit(&field, &doc).await, Parsed::Provided(value));
    }

    #[rstest]
    #[case(FieldKind::String)]
    #[case(FieldKind::Boolean)]
    #[case(FieldKind::Option(&["small", "large"]))]
    #[tokio::test]
    async fn unmodified_form_of_unset_field_stays_null(#[case] kind: FieldKind) {
        let field = FieldSpec::new("f", kind);
        let doc = stored(EntityKind::Sample, "s1", json!({}));
        assert_eq!(resubmit(&field, &doc).await, Parsed::Provided(Value::Null));
    }

    #[tokio::test]
    async fn unmodified_status_form_is_absent() {
        let field = crate::entities::SAMPLE.field("status").unwrap();
        let doc = stored(
            EntityKind::Sample,
            "s1",
            json!({"status": [{"name": "defined", "value": "yes", "timestamp": "2011-02-10T08:00:00Z"}]}),
        );
        assert_eq!(resubmit(field, &doc).await, Parsed::Absent);
    }

    #[tokio::test]
    async fn unmodified_grid_form_reproduces_grid() {
        let field = crate::entities::WORKSET.field("grid").unwrap();
        let grid = json!({
            "rows": 1, "columns": 2, "multiplex": 2,
            "arrangement": [[["s1", null], ["s2", null]]]
        });
        let doc = stored(
            EntityKind::Workset,
            "w1",
            json!({"samples": ["s1", "s2", "s3"], "grid": grid.clone()}),
        );
        let Parsed::Provided(value) = resubmit(field, &doc).await else {
            panic!("expected a grid");
        };
        assert_eq!(Grid::from_value(Some(&value)), Grid::from_value(Some(&grid)));
    }

    #[test]
    fn create_form_uses_defaults() {
        let operator = FieldSpec::new("operator", FieldKind::Reference(EntityKind::Account))
            .required()
            .default_login();
        let actor = Actor::new("acc-p", "per", Role::Engineer);
        let mut choices = FormChoices::default();
        choices
            .names
            .insert(EntityKind::Account, vec!["anna".into(), "per".into()]);
        let control = operator.render_edit_control(None, &actor, &choices);
        assert_eq!(control.default_inputs().first("operator"), Some("per"));
        let Widget::Select { options, .. } = control.widget else {
            panic!("expected a select");
        };
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn views_by_kind() {
        let doc = stored(
            EntityKind::Workset,
            "w1",
            json!({
                "password": "x",
                "operator": "per",
                "samples": ["s1", "s2"],
                "grid": {"rows": 2, "columns": 1, "multiplex": 1, "arrangement": [[[null]], [["s2"]]]}
            }),
        );
        let password = FieldSpec::new("password", FieldKind::Password);
        assert_eq!(password.render_view(&doc).value, ViewValue::Masked);

        let operator = FieldSpec::new("operator", FieldKind::Reference(EntityKind::Account));
        assert_eq!(
            operator.render_view(&doc).value,
            ViewValue::Link {
                entity: EntityKind::Account,
                name: "per".into()
            }
        );

        let samples = crate::entities::WORKSET.field("samples").unwrap();
        let ViewValue::Samples { samples } = samples.render_view(&doc).value else {
            panic!("expected samples");
        };
        assert_eq!(samples[0].coordinate, None);
        assert_eq!(samples[1].coordinate.as_deref(), Some("B1.1"));

        let grid = crate::entities::WORKSET.field("grid").unwrap();
        let ViewValue::Grid { columns, rows } = grid.render_view(&doc).value else {
            panic!("expected a grid");
        };
        assert_eq!(columns, vec!["1"]);
        assert_eq!(rows[1].label, "B");

        let missing = FieldSpec::new("description", FieldKind::Text);
        assert_eq!(missing.render_view(&doc).value, ViewValue::Empty);
    }
}
