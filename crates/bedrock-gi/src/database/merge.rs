//! Concatenating databases from independent ingestions.

use indexmap::IndexMap;
use tracing::info;

use super::CanonicalDatabase;
use crate::error::Result;
use crate::table::Table;
use crate::validation::{ValidationEngine, ValidationMode};

impl CanonicalDatabase {
    /// Concatenate `other` below `self`, table by table.
    ///
    /// Same-named tables are stacked with the union of their columns; tables
    /// present on one side only are copied. Rows are not deduplicated and
    /// the result is not validated; see [`merge_databases`].
    pub fn merge(&self, other: &CanonicalDatabase) -> CanonicalDatabase {
        CanonicalDatabase {
            project: self.project.concat(&other.project),
            location: self.location.concat(&other.location),
            sample: merge_optional(&self.sample, &other.sample),
            in_situ: merge_tables(&self.in_situ, &other.in_situ),
            lab: merge_tables(&self.lab, &other.lab),
            other: merge_tables(&self.other, &other.other),
            lon_lat_height: merge_optional(&self.lon_lat_height, &other.lon_lat_height),
        }
    }
}

/// Merge `incoming` into `target` and re-validate the result.
///
/// Key uniqueness only holds within one ingestion, so the merged database is
/// checked again in merged mode, where Project may hold several rows.
pub fn merge_databases(
    target: &CanonicalDatabase,
    incoming: &CanonicalDatabase,
) -> Result<CanonicalDatabase> {
    let merged = target.merge(incoming);
    ValidationEngine::new(ValidationMode::Merged)
        .validate(&merged)
        .into_result()?;

    info!(
        projects = merged.project.row_count(),
        locations = merged.location.row_count(),
        tables = merged.tables().len(),
        "merged databases"
    );
    Ok(merged)
}

fn merge_optional(left: &Option<Table>, right: &Option<Table>) -> Option<Table> {
    match (left, right) {
        (Some(l), Some(r)) => Some(l.concat(r)),
        (Some(t), None) | (None, Some(t)) => Some(t.clone()),
        (None, None) => None,
    }
}

fn merge_tables(
    left: &IndexMap<String, Table>,
    right: &IndexMap<String, Table>,
) -> IndexMap<String, Table> {
    let mut merged = left.clone();
    for (name, table) in right {
        let combined = match merged.get(name) {
            Some(existing) => existing.concat(table),
            None => table.clone(),
        };
        merged.insert(name.clone(), combined);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnKind, ColumnSchema, TableKind, TableSchema, Value};

    fn other_table(name: &str, column: &str, value: i64) -> Table {
        let mut table = Table::new(
            name,
            TableKind::Other,
            TableSchema::with_columns(vec![ColumnSchema::optional(column, ColumnKind::Any)]),
        );
        table.push_row(vec![Value::Int(value)]);
        table
    }

    #[test]
    fn test_merge_keeps_one_sided_tables() {
        let mut left = CanonicalDatabase::empty();
        left.other.insert("ABBR".into(), other_table("ABBR", "ABBR_CODE", 1));
        left.other.insert("DICT".into(), other_table("DICT", "DICT_TYPE", 2));

        let mut right = CanonicalDatabase::empty();
        right.other.insert("ABBR".into(), other_table("ABBR", "ABBR_DESC", 3));
        right.other.insert("UNIT".into(), other_table("UNIT", "UNIT_UNIT", 4));

        let merged = left.merge(&right);
        assert_eq!(
            merged.other.keys().collect::<Vec<_>>(),
            vec!["ABBR", "DICT", "UNIT"]
        );
        let abbr = &merged.other["ABBR"];
        assert_eq!(abbr.column_names(), vec!["ABBR_CODE", "ABBR_DESC"]);
        assert_eq!(abbr.row_count(), 2);
    }

    #[test]
    fn test_merge_optional_sample() {
        let mut left = CanonicalDatabase::empty();
        left.sample = Some(super::super::empty_table("Sample", TableKind::Sample));
        let merged = left.merge(&CanonicalDatabase::empty());
        assert!(merged.sample.is_some());
    }
}
