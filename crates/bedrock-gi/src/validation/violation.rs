//! Violation types reported by the validator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GiError, Result};

/// Broad class of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCategory {
    /// Column presence, nullability, type or row-count problems.
    SchemaViolation,
    /// A foreign key value with no matching parent key.
    ForeignKeyViolation,
}

/// Specific rule that was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A canonical column is absent.
    MissingColumn,
    /// A non-nullable column holds nulls.
    NullValue,
    /// A numeric column holds values that are not numbers.
    NotNumeric,
    /// The Project table has the wrong number of rows.
    RowCount,
    /// A key column holds repeated values.
    DuplicateKey,
    /// A foreign key references a missing parent row.
    ForeignKey,
}

impl ViolationKind {
    pub fn category(&self) -> ViolationCategory {
        match self {
            ViolationKind::ForeignKey => ViolationCategory::ForeignKeyViolation,
            _ => ViolationCategory::SchemaViolation,
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ViolationKind::MissingColumn => "Missing Column",
            ViolationKind::NullValue => "Null Value",
            ViolationKind::NotNumeric => "Not Numeric",
            ViolationKind::RowCount => "Row Count",
            ViolationKind::DuplicateKey => "Duplicate Key",
            ViolationKind::ForeignKey => "Foreign Key",
        }
    }
}

/// One violated invariant, located by table, column and rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Listed table name, e.g. `Sample` or `InSitu_GEOL`.
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Zero-based indices of the offending rows.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub rows: Vec<usize>,
    /// Offending values, deduplicated.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub values: Vec<String>,
    pub message: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, table: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            column: None,
            rows: Vec::new(),
            values: Vec::new(),
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_rows(mut self, rows: Vec<usize>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_values(mut self, values: Vec<String>) -> Self {
        self.values = values;
        self
    }

    pub fn category(&self) -> ViolationCategory {
        self.kind.category()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.label(), self.table)?;
        if let Some(column) = &self.column {
            write!(f, ".{}", column)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Every violation found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations of one category.
    pub fn of_category(&self, category: ViolationCategory) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(move |v| v.category() == category)
    }

    /// Violations in one listed table.
    pub fn for_table<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a Violation> {
        self.violations.iter().filter(move |v| v.table == table)
    }

    /// `Ok` if valid, otherwise a [`GiError::Validation`] carrying the report.
    pub fn into_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(GiError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return f.write_str("no violations");
        }
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}
