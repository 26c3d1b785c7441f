//! Fixed column sets of the canonical tables.

use crate::table::{ColumnKind, ColumnSchema, TableKind};

pub const PROJECT: &str = "Project";
pub const LOCATION: &str = "Location";
pub const SAMPLE: &str = "Sample";
pub const LON_LAT_HEIGHT: &str = "LonLatHeight";

pub const PROJECT_UID: &str = "project_uid";
pub const LOCATION_UID: &str = "location_uid";
pub const SAMPLE_UID: &str = "sample_uid";

/// Columns every table of `kind` starts with, in order.
///
/// Other tables have no canonical columns. Derived geometry columns are
/// not listed here; they are added to a table's own schema during
/// derivation.
pub fn canonical_columns(kind: TableKind) -> Vec<ColumnSchema> {
    match kind {
        TableKind::Project => vec![
            ColumnSchema::primary_key(PROJECT_UID),
            ColumnSchema::required("horizontal_crs", ColumnKind::Text),
            ColumnSchema::required("horizontal_crs_wkt", ColumnKind::Text),
            ColumnSchema::required("vertical_crs", ColumnKind::Text),
            ColumnSchema::required("vertical_crs_wkt", ColumnKind::Text),
        ],
        TableKind::Location => vec![
            ColumnSchema::primary_key(LOCATION_UID),
            ColumnSchema::required("location_source_id", ColumnKind::Any),
            ColumnSchema::foreign_key(PROJECT_UID, PROJECT),
            ColumnSchema::optional("location_type", ColumnKind::Any),
            ColumnSchema::required("easting", ColumnKind::Float),
            ColumnSchema::required("northing", ColumnKind::Float),
            ColumnSchema::optional("ground_level_elevation", ColumnKind::Float),
            ColumnSchema::optional("depth_to_base", ColumnKind::Float),
        ],
        TableKind::Sample => vec![
            ColumnSchema::primary_key(SAMPLE_UID),
            ColumnSchema::required("sample_source_id", ColumnKind::Text),
            ColumnSchema::foreign_key(PROJECT_UID, PROJECT),
            ColumnSchema::foreign_key(LOCATION_UID, LOCATION),
            ColumnSchema::required("location_source_id", ColumnKind::Any),
            ColumnSchema::required("depth_to_top", ColumnKind::Float),
            ColumnSchema::optional("depth_to_base", ColumnKind::Float),
        ],
        TableKind::InSitu => vec![
            ColumnSchema::foreign_key(PROJECT_UID, PROJECT),
            ColumnSchema::foreign_key(LOCATION_UID, LOCATION),
            ColumnSchema::required("depth_to_top", ColumnKind::Float),
            ColumnSchema::optional("depth_to_base", ColumnKind::Float),
        ],
        TableKind::Lab => vec![
            ColumnSchema::foreign_key(PROJECT_UID, PROJECT),
            ColumnSchema::foreign_key(SAMPLE_UID, SAMPLE),
            ColumnSchema {
                nullable: true,
                ..ColumnSchema::foreign_key(LOCATION_UID, LOCATION)
            },
        ],
        TableKind::LonLatHeight => vec![
            ColumnSchema::foreign_key(PROJECT_UID, PROJECT),
            ColumnSchema::foreign_key(LOCATION_UID, LOCATION),
            ColumnSchema::required("longitude", ColumnKind::Float),
            ColumnSchema::required("latitude", ColumnKind::Float),
            ColumnSchema::derived("wgs84_ground_level_height", ColumnKind::Float),
            ColumnSchema::derived("geometry", ColumnKind::Geometry),
        ],
        TableKind::Other => Vec::new(),
    }
}

/// Name under which a table is listed in the database.
pub fn qualified_name(kind: TableKind, name: &str) -> String {
    match kind {
        TableKind::InSitu => format!("InSitu_{}", name),
        TableKind::Lab => format!("Lab_{}", name),
        _ => name.to_string(),
    }
}
