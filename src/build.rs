// 📋 Build List - the ordered sequence of rows
//
// Pure list manipulation, no I/O. Positions are indexes: they are dense
// 0..N-1 by construction and shift when rows move.

use serde::{Deserialize, Serialize};

use crate::row::{BuildRow, RowField};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildList {
    rows: Vec<BuildRow>,
}

impl BuildList {
    pub fn new() -> Self {
        BuildList { rows: Vec::new() }
    }

    pub fn from_rows(rows: Vec<BuildRow>) -> Self {
        BuildList { rows }
    }

    pub fn rows(&self) -> &[BuildRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<BuildRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&BuildRow> {
        self.rows.get(position)
    }

    /// Rows paired with their position
    pub fn iter_positioned(&self) -> impl Iterator<Item = (usize, &BuildRow)> {
        self.rows.iter().enumerate()
    }

    /// Append to the end
    pub fn push(&mut self, row: BuildRow) {
        self.rows.push(row);
    }

    /// Remove the row at `position`; `None` when out of range
    pub fn remove(&mut self, position: usize) -> Option<BuildRow> {
        if position < self.rows.len() {
            Some(self.rows.remove(position))
        } else {
            None
        }
    }

    /// Move the row at `from` so it ends up at `to`, shifting the rows in
    /// between. Returns false (and leaves the list alone) when either index
    /// is out of range or they are equal.
    pub fn move_row(&mut self, from: usize, to: usize) -> bool {
        let len = self.rows.len();
        if from >= len || to >= len || from == to {
            return false;
        }

        let row = self.rows.remove(from);
        self.rows.insert(to, row);
        true
    }

    /// Overwrite one field of the row at `position`
    pub fn set_field(&mut self, position: usize, field: RowField, value: &str) -> bool {
        match self.rows.get_mut(position) {
            Some(row) => {
                row.set_field(field, value);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Replace every row at once
    pub fn replace(&mut self, rows: Vec<BuildRow>) {
        self.rows = rows;
    }

    /// Sum of all prices; malformed or missing prices count as 0
    pub fn total(&self) -> f64 {
        self.rows.iter().map(BuildRow::price_value).sum()
    }
}
