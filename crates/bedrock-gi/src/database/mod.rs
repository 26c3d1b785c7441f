//! The canonical relational database produced by one or more ingestions.

mod layout;
mod merge;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::table::{Table, TableKind, TableSchema, Value};

pub use layout::{
    LOCATION, LOCATION_UID, LON_LAT_HEIGHT, PROJECT, PROJECT_UID, SAMPLE, SAMPLE_UID,
    canonical_columns, qualified_name,
};
pub use merge::merge_databases;

/// Project, Location, Sample, In-Situ, Lab and Other tables.
///
/// In-Situ, Lab and Other tables are keyed by their originating group name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDatabase {
    pub project: Table,
    pub location: Table,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sample: Option<Table>,
    pub in_situ: IndexMap<String, Table>,
    pub lab: IndexMap<String, Table>,
    pub other: IndexMap<String, Table>,
    /// Geodetic location points, present after geometry derivation.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lon_lat_height: Option<Table>,
}

impl CanonicalDatabase {
    /// A database with empty Project and Location tables.
    pub fn empty() -> Self {
        Self {
            project: empty_table(PROJECT, TableKind::Project),
            location: empty_table(LOCATION, TableKind::Location),
            sample: None,
            in_situ: IndexMap::new(),
            lab: IndexMap::new(),
            other: IndexMap::new(),
            lon_lat_height: None,
        }
    }

    /// All tables with their listed names, in a fixed order.
    pub fn tables(&self) -> Vec<(String, &Table)> {
        let mut tables = vec![
            (PROJECT.to_string(), &self.project),
            (LOCATION.to_string(), &self.location),
        ];
        if let Some(lon_lat_height) = &self.lon_lat_height {
            tables.push((LON_LAT_HEIGHT.to_string(), lon_lat_height));
        }
        if let Some(sample) = &self.sample {
            tables.push((SAMPLE.to_string(), sample));
        }
        for group in [&self.in_situ, &self.lab, &self.other] {
            for table in group.values() {
                tables.push((qualified_name(table.kind, &table.name), table));
            }
        }
        tables
    }

    /// Listed table names.
    pub fn table_names(&self) -> Vec<String> {
        self.tables().into_iter().map(|(name, _)| name).collect()
    }

    /// Look up a table by its listed name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables()
            .into_iter()
            .find(|(listed, _)| listed == name)
            .map(|(_, table)| table)
    }

    /// The table a foreign key named `references` points at.
    pub fn referenced_table(&self, references: &str) -> Option<&Table> {
        match references {
            PROJECT => Some(&self.project),
            LOCATION => Some(&self.location),
            SAMPLE => self.sample.as_ref(),
            _ => None,
        }
    }

    /// Distinct project identifiers, in row order.
    pub fn project_uids(&self) -> Vec<String> {
        distinct_text(&self.project, PROJECT_UID)
    }

    /// Total number of rows across all tables.
    pub fn total_rows(&self) -> usize {
        self.tables().iter().map(|(_, t)| t.row_count()).sum()
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for CanonicalDatabase {
    fn default() -> Self {
        Self::empty()
    }
}

/// An empty table with the canonical columns of `kind`.
pub fn empty_table(name: &str, kind: TableKind) -> Table {
    Table::new(
        name,
        kind,
        TableSchema::with_columns(canonical_columns(kind)),
    )
}

/// Distinct non-null values of a column rendered as text.
pub(crate) fn distinct_text(table: &Table, column: &str) -> Vec<String> {
    let mut seen = indexmap::IndexSet::new();
    if let Some(values) = table.column(column) {
        for value in values.filter(|v: &&Value| !v.is_null()) {
            seen.insert(value.to_string());
        }
    }
    seen.into_iter().collect()
}
