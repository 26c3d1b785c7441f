//! Grouped tabular data as produced by the AGS decoders.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::{NULL, Value};

/// Decoded groups keyed by group name, in order of first appearance.
pub type GroupMap = IndexMap<String, GroupTable>;

/// One AGS group: named columns and typed rows.
///
/// Created once per parsed group and not modified afterwards; the mapper
/// builds new canonical tables instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTable {
    /// Group name, e.g. `HOLE`.
    pub name: String,
    /// Column headers.
    pub headers: Vec<String>,
    /// Row data (row-major order).
    pub rows: Vec<Vec<Value>>,
}

impl GroupTable {
    /// Create a new group table.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Get all values for a column by name.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value> + use<'a>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(move |row| row.get(index).unwrap_or(&NULL)),
        )
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(index))
    }

    /// Drop columns in which every value is null.
    ///
    /// Groups without rows keep their headers, since there is no evidence
    /// that any column is empty.
    pub fn without_null_columns(self) -> Self {
        if self.rows.is_empty() {
            return self;
        }

        let keep: Vec<bool> = (0..self.headers.len())
            .map(|i| {
                self.rows
                    .iter()
                    .any(|row| row.get(i).is_some_and(|v| !v.is_null()))
            })
            .collect();

        let headers = self
            .headers
            .into_iter()
            .zip(&keep)
            .filter_map(|(h, &k)| k.then_some(h))
            .collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&keep)
                    .filter_map(|(v, &k)| k.then_some(v))
                    .collect()
            })
            .collect();

        Self {
            name: self.name,
            headers,
            rows,
        }
    }
}
