//! Sample grids: dimensions plus an optional 3-D arrangement of samples.

use lims_core::errors::CoreError;
use lims_core::grid::{Arrangement, Grid, GridDimensions, MAX_DIMENSION, MAX_SLOTS};
use lims_core::store::DocumentStore;

use crate::field::{FieldContext, FieldSpec, Parsed};
use crate::request::{RequestValues, normalize};

const DIMENSIONS: [&str; 3] = ["rows", "columns", "multiplex"];

/// Input key of one cell, with 1-based row and column.
#[must_use]
pub fn cell_key(field: &str, row: usize, column: usize) -> String {
    format!("{field}_arrangement_{}_{}", row + 1, column + 1)
}

/// Input key of one dimension.
#[must_use]
pub fn dimension_key(field: &str, dimension: &str) -> String {
    format!("{field}_{dimension}")
}

/// A positive integer, else undefined.
fn parse_dimension(raw: &str) -> Option<usize> {
    raw.parse::<usize>().ok().filter(|size| *size > 0)
}

/// Update the grid from cell and dimension inputs.
///
/// All three dimension inputs must carry a value for the field to count as
/// targeted. Cells are read from the current arrangement's coordinates; a
/// cell without input is cleared. A dimension change resizes into fresh
/// storage and silently drops placements outside the new bounds. Defined
/// dimensions beyond the size limits are an invalid value.
pub(crate) fn parse<S: DocumentStore>(
    field: &FieldSpec,
    ctx: &FieldContext<'_, S>,
    values: &RequestValues,
) -> Result<Parsed, CoreError> {
    if ctx.is_create() {
        return Ok(Parsed::Provided(Grid::default().to_value()));
    }
    let mut dimensions = [None; 3];
    for (slot, dimension) in dimensions.iter_mut().zip(DIMENSIONS) {
        let Some(raw) = values
            .first(&dimension_key(field.name, dimension))
            .and_then(normalize)
        else {
            return Ok(Parsed::Absent);
        };
        *slot = parse_dimension(&raw);
    }
    let [rows, columns, multiplex] = dimensions;

    let current = Grid::from_value(ctx.current_value(field.name));
    let mut arrangement = current.arrangement.clone();
    if let Some(arrangement) = arrangement.as_mut() {
        let dims = arrangement.dimensions();
        for row in 0..dims.rows {
            for column in 0..dims.columns {
                let samples = values
                    .all(&cell_key(field.name, row, column))
                    .iter()
                    .map(|sample| normalize(sample));
                arrangement.set_cell(row, column, samples);
            }
        }
    }

    let arrangement = match (rows, columns, multiplex) {
        (Some(rows), Some(columns), Some(multiplex)) => {
            let dims = GridDimensions::bounded(rows, columns, multiplex).ok_or_else(|| {
                CoreError::invalid(
                    field.name,
                    format!(
                        "{rows} x {columns} x {multiplex} is too large; at most \
                         {MAX_DIMENSION} per dimension and {MAX_SLOTS} slots"
                    ),
                )
            })?;
            let mut arrangement = match arrangement {
                Some(existing) if existing.dimensions() == dims => existing,
                Some(existing) => existing.resized(dims),
                None => Arrangement::new(dims),
            };
            arrangement.dedupe();
            Some(arrangement)
        }
        _ => None,
    };

    let grid = Grid {
        rows,
        columns,
        multiplex,
        arrangement,
    };
    Ok(Parsed::Provided(grid.to_value()))
}
