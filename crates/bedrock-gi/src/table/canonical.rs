//! Canonical relational tables with a schema descriptor.

use serde::{Deserialize, Serialize};

use super::group::GroupTable;
use super::schema::{ColumnSchema, TableSchema};
use super::value::{NULL, Value};

/// Category of a canonical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Project,
    Location,
    Sample,
    /// Field measurements tied to a location.
    InSitu,
    /// Laboratory measurements tied to a sample.
    Lab,
    /// Pass-through groups without a recognised foreign key.
    Other,
    /// Geodetic location points derived from `Location`.
    LonLatHeight,
}

impl TableKind {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            TableKind::Project => "Project",
            TableKind::Location => "Location",
            TableKind::Sample => "Sample",
            TableKind::InSitu => "In-Situ",
            TableKind::Lab => "Lab",
            TableKind::Other => "Other",
            TableKind::LonLatHeight => "LonLatHeight",
        }
    }
}

/// A named table of typed rows described by a [`TableSchema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name, e.g. `Location` or the originating group name.
    pub name: String,
    /// Category of the table.
    pub kind: TableKind,
    /// Column descriptors, in column order.
    pub schema: TableSchema,
    /// Row data (row-major, aligned with `schema.columns`).
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table.
    pub fn new(name: impl Into<String>, kind: TableKind, schema: TableSchema) -> Self {
        Self {
            name: name.into(),
            kind,
            schema,
            rows: Vec::new(),
        }
    }

    /// Copy a group verbatim, every column a pass-through source column.
    pub fn from_group(group: &GroupTable, kind: TableKind) -> Self {
        let schema = TableSchema::with_columns(
            group.headers.iter().map(ColumnSchema::source).collect(),
        );
        Self {
            name: group.name.clone(),
            kind,
            schema,
            rows: group.rows.clone(),
        }
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.schema.column_count()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.column_names()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.position(name).is_some()
    }

    /// Get all values for a column by name.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value> + use<'a>> {
        let index = self.schema.position(name)?;
        Some(
            self.rows
                .iter()
                .map(move |row| row.get(index).unwrap_or(&NULL)),
        )
    }

    /// Get a specific cell value.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.schema.position(column)?;
        self.rows.get(row).map(|r| r.get(index).unwrap_or(&NULL))
    }

    /// Append a row, padding or truncating it to the schema width.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.schema.column_count(), Value::Null);
        self.rows.push(row);
    }

    /// Return a new table with `column` appended, or replaced if it exists.
    ///
    /// `values` must hold one value per row; missing values become null.
    pub fn with_column(mut self, column: ColumnSchema, values: Vec<Value>) -> Self {
        let mut values = values.into_iter();
        match self.schema.position(&column.name) {
            Some(index) => {
                self.schema.columns[index] = column;
                for row in &mut self.rows {
                    row[index] = values.next().unwrap_or_default();
                }
            }
            None => {
                self.schema.columns.push(column);
                for row in &mut self.rows {
                    row.push(values.next().unwrap_or_default());
                }
            }
        }
        self
    }

    /// Concatenate `other` below `self`.
    ///
    /// Columns are the union of both tables in first-seen order; cells a
    /// table has no column for become null.
    pub fn concat(&self, other: &Table) -> Table {
        let mut schema = self.schema.clone();
        for column in &other.schema.columns {
            if schema.position(&column.name).is_none() {
                schema.columns.push(column.clone());
            }
        }

        let mut merged = Table::new(self.name.clone(), self.kind, schema);
        for part in [self, other] {
            let positions: Vec<Option<usize>> = merged
                .schema
                .columns
                .iter()
                .map(|c| part.schema.position(&c.name))
                .collect();
            for row in &part.rows {
                merged.rows.push(
                    positions
                        .iter()
                        .map(|p| p.and_then(|i| row.get(i).cloned()).unwrap_or_default())
                        .collect(),
                );
            }
        }
        merged
    }
}
