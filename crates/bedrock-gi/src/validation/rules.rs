//! Individual validation rules.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use super::violation::{Violation, ViolationKind};
use crate::database::{CanonicalDatabase, PROJECT, canonical_columns, distinct_text};
use crate::table::{ColumnSchema, ColumnRole, Table};

/// A check over a whole canonical database.
pub trait Validator: Send + Sync {
    /// Run the check and return every violation found.
    fn validate(&self, db: &CanonicalDatabase) -> Vec<Violation>;
}

/// How many Project rows a database may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// One ingestion: exactly one Project row.
    #[default]
    SingleProject,
    /// Several ingestions merged: at least one Project row.
    Merged,
}

/// Column descriptors to check for a table: the canonical set for its kind,
/// then any further columns of its own schema.
fn checked_columns(table: &Table) -> Vec<ColumnSchema> {
    let mut columns = canonical_columns(table.kind);
    for column in &table.schema.columns {
        if !columns.iter().any(|c| c.name == column.name) {
            columns.push(column.clone());
        }
    }
    columns
}

/// Every canonical column is present.
pub struct ColumnPresenceValidator;

impl Validator for ColumnPresenceValidator {
    fn validate(&self, db: &CanonicalDatabase) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (name, table) in db.tables() {
            for column in canonical_columns(table.kind) {
                if !table.has_column(&column.name) {
                    violations.push(
                        Violation::new(
                            ViolationKind::MissingColumn,
                            name.clone(),
                            format!("required column '{}' is missing", column.name),
                        )
                        .with_column(column.name),
                    );
                }
            }
        }
        violations
    }
}

/// The Project table has the number of rows the mode allows.
pub struct ProjectRowCountValidator {
    pub mode: ValidationMode,
}

impl Validator for ProjectRowCountValidator {
    fn validate(&self, db: &CanonicalDatabase) -> Vec<Violation> {
        let rows = db.project.row_count();
        let message = match self.mode {
            ValidationMode::SingleProject if rows != 1 => {
                format!("expected exactly one row, found {}", rows)
            }
            ValidationMode::Merged if rows == 0 => "expected at least one row, found 0".to_string(),
            _ => return Vec::new(),
        };
        vec![Violation::new(ViolationKind::RowCount, PROJECT, message)]
    }
}

/// Non-nullable columns hold no nulls.
pub struct NullabilityValidator;

impl Validator for NullabilityValidator {
    fn validate(&self, db: &CanonicalDatabase) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (name, table) in db.tables() {
            for column in checked_columns(table).iter().filter(|c| !c.nullable) {
                let Some(values) = table.column(&column.name) else {
                    continue;
                };
                let rows: Vec<usize> = values
                    .enumerate()
                    .filter(|(_, v)| v.is_null())
                    .map(|(i, _)| i)
                    .collect();
                if !rows.is_empty() {
                    violations.push(
                        Violation::new(
                            ViolationKind::NullValue,
                            name.clone(),
                            format!("{} null value(s) in a non-nullable column", rows.len()),
                        )
                        .with_column(column.name.clone())
                        .with_rows(rows),
                    );
                }
            }
        }
        violations
    }
}

/// Numeric columns hold values coercible to floating point.
pub struct NumericValidator;

impl Validator for NumericValidator {
    fn validate(&self, db: &CanonicalDatabase) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (name, table) in db.tables() {
            for column in checked_columns(table).iter().filter(|c| c.kind.is_numeric()) {
                let Some(values) = table.column(&column.name) else {
                    continue;
                };
                let mut rows = Vec::new();
                let mut bad = IndexSet::new();
                for (i, value) in values.enumerate() {
                    if !value.is_null() && value.as_f64().is_none() {
                        rows.push(i);
                        bad.insert(value.to_string());
                    }
                }
                if !rows.is_empty() {
                    violations.push(
                        Violation::new(
                            ViolationKind::NotNumeric,
                            name.clone(),
                            format!("{} value(s) are not numbers", rows.len()),
                        )
                        .with_column(column.name.clone())
                        .with_rows(rows)
                        .with_values(bad.into_iter().collect()),
                    );
                }
            }
        }
        violations
    }
}

/// Primary key columns hold unique values.
pub struct UniqueKeyValidator;

impl Validator for UniqueKeyValidator {
    fn validate(&self, db: &CanonicalDatabase) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (name, table) in db.tables() {
            let keys = canonical_columns(table.kind)
                .into_iter()
                .filter(|c| c.role == ColumnRole::PrimaryKey);
            for key in keys {
                let Some(values) = table.column(&key.name) else {
                    continue;
                };
                let mut positions: IndexMap<String, Vec<usize>> = IndexMap::new();
                for (i, value) in values.enumerate().filter(|(_, v)| !v.is_null()) {
                    positions.entry(value.to_string()).or_default().push(i);
                }

                let duplicates: Vec<(String, Vec<usize>)> = positions
                    .into_iter()
                    .filter(|(_, rows)| rows.len() > 1)
                    .collect();
                if duplicates.is_empty() {
                    continue;
                }
                let values: Vec<String> = duplicates.iter().map(|(v, _)| v.clone()).collect();
                let mut rows: Vec<usize> = duplicates.into_iter().flat_map(|(_, r)| r).collect();
                rows.sort_unstable();
                violations.push(
                    Violation::new(
                        ViolationKind::DuplicateKey,
                        name.clone(),
                        format!("{} key value(s) occur more than once", values.len()),
                    )
                    .with_column(key.name.clone())
                    .with_rows(rows)
                    .with_values(values),
                );
            }
        }
        violations
    }
}

/// Foreign key values exist in the referenced table's key column.
pub struct ForeignKeyValidator;

impl Validator for ForeignKeyValidator {
    fn validate(&self, db: &CanonicalDatabase) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (name, table) in db.tables() {
            for column in canonical_columns(table.kind) {
                let Some(references) = column.references() else {
                    continue;
                };
                let Some(values) = table.column(&column.name) else {
                    continue;
                };
                let parent_keys: HashSet<String> = db
                    .referenced_table(references)
                    .map(|parent| distinct_text(parent, &column.name).into_iter().collect())
                    .unwrap_or_default();

                let mut rows = Vec::new();
                let mut missing = IndexSet::new();
                for (i, value) in values.enumerate().filter(|(_, v)| !v.is_null()) {
                    let key = value.to_string();
                    if !parent_keys.contains(&key) {
                        rows.push(i);
                        missing.insert(key);
                    }
                }
                if rows.is_empty() {
                    continue;
                }
                let missing: Vec<String> = missing.into_iter().collect();
                violations.push(
                    Violation::new(
                        ViolationKind::ForeignKey,
                        name.clone(),
                        format!(
                            "{} row(s) reference {} value(s) not found in {}.{}: {}",
                            rows.len(),
                            column.name,
                            references,
                            column.name,
                            missing.join(", ")
                        ),
                    )
                    .with_column(column.name.clone())
                    .with_rows(rows)
                    .with_values(missing),
                );
            }
        }
        violations
    }
}
