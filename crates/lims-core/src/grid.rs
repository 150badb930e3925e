//! Three-dimensional sample arrangement (row × column × multiplex slot).
//!
//! Storage is one flat vector of optional sample names, indexed
//! `(row * columns + column) * multiplex + slot`. Every resize allocates a
//! fresh vector and copies the overlapping region, so no two cells ever share
//! storage. On the wire an arrangement is a list of rows of columns of slots,
//! and the grid carrying it is `{rows, columns, multiplex, arrangement}`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rows of columns of multiplex slots.
pub type NestedArrangement = Vec<Vec<Vec<Option<String>>>>;

/// Position of a placement, all indexes 0-based.
pub type Coordinate = (usize, usize, usize);

/// Largest accepted size of a single dimension.
pub const MAX_DIMENSION: usize = 1024;

/// Largest accepted number of slots in one arrangement.
pub const MAX_SLOTS: usize = 65_536;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub rows: usize,
    pub columns: usize,
    pub multiplex: usize,
}

impl GridDimensions {
    #[must_use]
    pub const fn new(rows: usize, columns: usize, multiplex: usize) -> Self {
        Self {
            rows,
            columns,
            multiplex,
        }
    }

    /// Dimensions that are positive and within [`MAX_DIMENSION`] and
    /// [`MAX_SLOTS`], else `None`.
    #[must_use]
    pub fn bounded(rows: usize, columns: usize, multiplex: usize) -> Option<Self> {
        let sizes = [rows, columns, multiplex];
        if !sizes.iter().all(|size| (1..=MAX_DIMENSION).contains(size)) {
            return None;
        }
        let slots = rows.checked_mul(columns)?.checked_mul(multiplex)?;
        (slots <= MAX_SLOTS).then_some(Self::new(rows, columns, multiplex))
    }

    /// Total number of slots, saturating.
    #[must_use]
    pub const fn len(self) -> usize {
        self.rows
            .saturating_mul(self.columns)
            .saturating_mul(self.multiplex)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NestedArrangement", into = "NestedArrangement")]
pub struct Arrangement {
    dims: GridDimensions,
    cells: Vec<Option<String>>,
}

impl Arrangement {
    /// An arrangement with every slot empty.
    #[must_use]
    pub fn new(dims: GridDimensions) -> Self {
        Self {
            dims,
            cells: vec![None; dims.len()],
        }
    }

    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dims
    }

    const fn index(&self, row: usize, column: usize, slot: usize) -> Option<usize> {
        if row < self.dims.rows && column < self.dims.columns && slot < self.dims.multiplex {
            Some((row * self.dims.columns + column) * self.dims.multiplex + slot)
        } else {
            None
        }
    }

    #[must_use]
    pub fn get(&self, row: usize, column: usize, slot: usize) -> Option<&str> {
        self.index(row, column, slot)
            .and_then(|idx| self.cells[idx].as_deref())
    }

    /// Place (or clear) one slot. Returns `false` when out of range.
    pub fn set(&mut self, row: usize, column: usize, slot: usize, sample: Option<String>) -> bool {
        match self.index(row, column, slot) {
            Some(idx) => {
                self.cells[idx] = sample;
                true
            }
            None => false,
        }
    }

    /// Slots of one cell.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> &[Option<String>] {
        match self.index(row, column, 0) {
            Some(start) => &self.cells[start..start + self.dims.multiplex],
            None => &[],
        }
    }

    /// Replace the slots of one cell, padding with empties or truncating to
    /// the multiplex size. Returns `false` when the cell is out of range.
    pub fn set_cell<I>(&mut self, row: usize, column: usize, samples: I) -> bool
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let Some(start) = self.index(row, column, 0) else {
            return false;
        };
        let mut incoming = samples.into_iter();
        for slot in &mut self.cells[start..start + self.dims.multiplex] {
            *slot = incoming.next().flatten();
        }
        true
    }

    /// Copy of this arrangement with new dimensions. Placements inside the
    /// overlapping region keep their coordinates; the rest are dropped.
    #[must_use]
    pub fn resized(&self, dims: GridDimensions) -> Self {
        let mut resized = Self::new(dims);
        let rows = self.dims.rows.min(dims.rows);
        let columns = self.dims.columns.min(dims.columns);
        let slots = self.dims.multiplex.min(dims.multiplex);
        for row in 0..rows {
            for column in 0..columns {
                for slot in 0..slots {
                    if let Some(sample) = self.get(row, column, slot) {
                        resized.set(row, column, slot, Some(sample.to_string()));
                    }
                }
            }
        }
        resized
    }

    /// Null out every occurrence of a sample after its first, scanning rows,
    /// then columns, then slots.
    pub fn dedupe(&mut self) {
        let mut seen = BTreeSet::new();
        for slot in &mut self.cells {
            let duplicate = slot
                .as_deref()
                .is_some_and(|sample| !seen.insert(sample.to_string()));
            if duplicate {
                *slot = None;
            }
        }
    }

    /// Clear every placement whose sample fails the predicate.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        for slot in &mut self.cells {
            if slot.as_deref().is_some_and(|sample| !keep(sample)) {
                *slot = None;
            }
        }
    }

    /// First coordinate of every placed sample.
    #[must_use]
    pub fn placements(&self) -> BTreeMap<String, Coordinate> {
        let mut result = BTreeMap::new();
        for row in 0..self.dims.rows {
            for column in 0..self.dims.columns {
                for slot in 0..self.dims.multiplex {
                    if let Some(sample) = self.get(row, column, slot) {
                        result
                            .entry(sample.to_string())
                            .or_insert((row, column, slot));
                    }
                }
            }
        }
        result
    }

    #[must_use]
    pub fn to_nested(&self) -> NestedArrangement {
        (0..self.dims.rows)
            .map(|row| {
                (0..self.dims.columns)
                    .map(|column| self.cell(row, column).to_vec())
                    .collect()
            })
            .collect()
    }
}

impl TryFrom<NestedArrangement> for Arrangement {
    type Error = String;

    /// Ragged input is normalised to the largest row and cell lengths.
    /// Input beyond the size limits is refused.
    fn try_from(nested: NestedArrangement) -> Result<Self, Self::Error> {
        let columns = nested.iter().map(Vec::len).max().unwrap_or(0);
        let multiplex = nested
            .iter()
            .flat_map(|row| row.iter().map(Vec::len))
            .max()
            .unwrap_or(0);
        let dims = GridDimensions::new(nested.len(), columns, multiplex);
        if !dims.is_empty() && GridDimensions::bounded(dims.rows, dims.columns, dims.multiplex).is_none() {
            return Err(format!(
                "arrangement of {} x {} x {} exceeds {MAX_SLOTS} slots",
                dims.rows, dims.columns, dims.multiplex
            ));
        }
        let mut arrangement = Self::new(dims);
        for (row, cells) in nested.into_iter().enumerate() {
            for (column, samples) in cells.into_iter().enumerate() {
                arrangement.set_cell(row, column, samples);
            }
        }
        Ok(arrangement)
    }
}

impl From<Arrangement> for NestedArrangement {
    fn from(arrangement: Arrangement) -> Self {
        arrangement.to_nested()
    }
}

/// Stored value of a grid field. A dimension is `None` when undefined; the
/// arrangement only exists while all three dimensions are defined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    #[serde(default)]
    pub rows: Option<usize>,
    #[serde(default)]
    pub columns: Option<usize>,
    #[serde(default)]
    pub multiplex: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrangement: Option<Arrangement>,
}

impl Grid {
    /// Read a grid from a stored field value; anything unreadable is empty.
    #[must_use]
    pub fn from_value(value: Option<&Value>) -> Self {
        value
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// All three dimensions, when each is defined and the grid is within
    /// the size limits.
    #[must_use]
    pub fn dimensions(&self) -> Option<GridDimensions> {
        match (self.rows, self.columns, self.multiplex) {
            (Some(rows), Some(columns), Some(multiplex)) => {
                GridDimensions::bounded(rows, columns, multiplex)
            }
            _ => None,
        }
    }
}

/// Spreadsheet-style coordinate label from 0-based indexes: row letter,
/// 1-based column, `.k` for the multiplex slot. `(0, 1, 2)` is `"A2.3"`.
#[must_use]
pub fn grid_coordinate(row: Option<usize>, column: Option<usize>, slot: Option<usize>) -> String {
    let mut label = String::new();
    if let Some(row) = row {
        label.push_str(&row_letters(row));
    }
    if let Some(column) = column {
        label.push_str(&(column + 1).to_string());
    }
    if let Some(slot) = slot {
        label.push('.');
        label.push_str(&(slot + 1).to_string());
    }
    label
}

fn row_letters(mut row: usize) -> String {
    let mut letters = Vec::new();
    loop {
        #[allow(clippy::cast_possible_truncation)]
        letters.push(char::from(b'A' + (row % 26) as u8));
        if row < 26 {
            break;
        }
        row = row / 26 - 1;
    }
    letters.iter().rev().collect()
}
