//! Schema descriptors for canonical tables.

use serde::{Deserialize, Serialize};

/// Scalar kind a column is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Text values (identifiers, descriptions, CRS text).
    Text,
    /// Whole numbers.
    Integer,
    /// Values coercible to floating point.
    Float,
    /// Boolean values.
    Boolean,
    /// Geometry encoded as well-known text.
    Geometry,
    /// Carried through without a type expectation.
    Any,
}

impl ColumnKind {
    /// Returns true if this kind is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

/// What a column means within its table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ColumnRole {
    /// The table's own key.
    PrimaryKey,
    /// A reference to the key column of another table.
    ForeignKey { references: String },
    /// A canonical attribute (easting, depth_to_top, ...).
    Attribute,
    /// A value computed during geospatial derivation.
    Derived,
    /// A column copied unchanged from the source group.
    Source,
}

/// Schema for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// Expected scalar kind.
    pub kind: ColumnKind,
    /// Whether null values are allowed.
    pub nullable: bool,
    /// Role of the column in the relational model.
    #[serde(flatten)]
    pub role: ColumnRole,
}

impl ColumnSchema {
    /// A non-nullable canonical attribute.
    pub fn required(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            role: ColumnRole::Attribute,
        }
    }

    /// A nullable canonical attribute.
    pub fn optional(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            nullable: true,
            ..Self::required(name, kind)
        }
    }

    /// The table's primary key column.
    pub fn primary_key(name: impl Into<String>) -> Self {
        Self {
            role: ColumnRole::PrimaryKey,
            ..Self::required(name, ColumnKind::Text)
        }
    }

    /// A foreign key referencing `table`.
    pub fn foreign_key(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            role: ColumnRole::ForeignKey {
                references: table.into(),
            },
            ..Self::required(name, ColumnKind::Text)
        }
    }

    /// A derived value, always nullable.
    pub fn derived(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            role: ColumnRole::Derived,
            ..Self::optional(name, kind)
        }
    }

    /// A pass-through source column.
    pub fn source(name: impl Into<String>) -> Self {
        Self {
            role: ColumnRole::Source,
            ..Self::optional(name, ColumnKind::Any)
        }
    }

    /// The referenced table, if this is a foreign key.
    pub fn references(&self) -> Option<&str> {
        match &self.role {
            ColumnRole::ForeignKey { references } => Some(references),
            _ => None,
        }
    }
}

/// Schema for an entire table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Schemas for each column, in order.
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Create a new empty table schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table schema with the given columns.
    pub fn with_columns(columns: Vec<ColumnSchema>) -> Self {
        Self { columns }
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get all column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Columns that reference another table.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter().filter(|c| c.references().is_some())
    }

    /// The primary key column, if the table has one.
    pub fn primary_key(&self) -> Option<&ColumnSchema> {
        self.columns
            .iter()
            .find(|c| c.role == ColumnRole::PrimaryKey)
    }
}
