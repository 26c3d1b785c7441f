//! Elevations, geodetic coordinates and geometries for canonical tables.

use std::collections::HashMap;

use tracing::info;

use super::crs::{CrsId, CrsRegistry};
use super::geometry::Geometry;
use super::transform::GeodeticTransform;
use crate::database::{
    CanonicalDatabase, LOCATION_UID, LON_LAT_HEIGHT, PROJECT_UID, canonical_columns,
};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity, Stage};
use crate::error::{GiError, Result};
use crate::table::{ColumnKind, ColumnSchema, Table, TableKind, TableSchema, Value};

/// Plan position and ground level of a location.
#[derive(Debug, Clone, Copy)]
struct Collar {
    easting: Option<f64>,
    northing: Option<f64>,
    ground_level: Option<f64>,
}

/// The single horizontal and vertical CRS shared by all Project rows.
///
/// Fails with [`GiError::AmbiguousCrs`] if the rows disagree.
pub fn project_crs(db: &CanonicalDatabase) -> Result<(CrsId, CrsId)> {
    let mut found: Vec<(String, String)> = Vec::new();
    for row in 0..db.project.row_count() {
        let text = |column: &str| {
            db.project
                .value(row, column)
                .map(Value::to_string)
                .unwrap_or_default()
        };
        let pair = (text("horizontal_crs"), text("vertical_crs"));
        if !found.contains(&pair) {
            found.push(pair);
        }
    }

    match found.as_slice() {
        [(horizontal, vertical)] => Ok((horizontal.parse()?, vertical.parse()?)),
        [] => Err(GiError::Projection(
            "the Project table holds no CRS".to_string(),
        )),
        _ => Err(GiError::AmbiguousCrs {
            found: found
                .into_iter()
                .map(|(h, v)| format!("{} + {}", h, v))
                .collect(),
        }),
    }
}

/// Add derived elevations, geodetic coordinates and geometries.
///
/// Location gains `elevation_at_base`, `geometry`, `longitude`, `latitude`
/// and `wgs84_ground_level_height`, and a `LonLatHeight` table of geodetic
/// points is built from it. Sample and every In-Situ table gain
/// `elevation_at_top`, `elevation_at_base` and `geometry`, found through
/// their owning location. Returns a new database; `db` is not modified.
///
/// A location that cannot be transformed to WGS 84 gets null geodetic
/// values and a `ProjectionFailed` warning; the other rows are unaffected.
pub fn derive_geometry(
    db: &CanonicalDatabase,
    registry: &dyn CrsRegistry,
    diagnostics: &mut Diagnostics,
) -> Result<CanonicalDatabase> {
    let (horizontal_id, vertical_id) = project_crs(db)?;
    let horizontal = registry.resolve(&horizontal_id)?;
    let transform = GeodeticTransform::new(&horizontal, registry.geoid(&vertical_id))?;

    if !transform.has_geoid() {
        diagnostics.push(
            Diagnostic::new(
                Stage::Derive,
                Severity::Warning,
                DiagnosticKind::HeightOmitted,
                format!(
                    "no geoid model registered for {}, ellipsoidal heights left null",
                    vertical_id
                ),
            )
            .in_table(db.location.name.clone())
            .in_column("wgs84_ground_level_height"),
        );
    }

    let mut derived = db.clone();
    let (location, lon_lat_height) = derive_location(&db.location, &transform, diagnostics);

    let collars = collars(&location);
    derived.sample = db
        .sample
        .as_ref()
        .map(|sample| derive_depth_geometry(sample, &collars));
    derived.in_situ = db
        .in_situ
        .iter()
        .map(|(name, table)| (name.clone(), derive_depth_geometry(table, &collars)))
        .collect();
    derived.location = location;
    derived.lon_lat_height = Some(lon_lat_height);

    info!(
        crs = %horizontal_id,
        locations = derived.location.row_count(),
        in_situ_tables = derived.in_situ.len(),
        "derived geometry"
    );
    Ok(derived)
}

/// Rows whose coordinates cannot be projected keep their elevations and
/// collar geometry but get null geodetic values and a warning.
fn derive_location(
    location: &Table,
    transform: &GeodeticTransform,
    diagnostics: &mut Diagnostics,
) -> (Table, Table) {
    let rows = location.row_count();
    let mut elevation_at_base = Vec::with_capacity(rows);
    let mut geometry = Vec::with_capacity(rows);
    let mut longitude = Vec::with_capacity(rows);
    let mut latitude = Vec::with_capacity(rows);
    let mut height = Vec::with_capacity(rows);

    let mut points = Table::new(
        LON_LAT_HEIGHT,
        TableKind::LonLatHeight,
        TableSchema::with_columns(canonical_columns(TableKind::LonLatHeight)),
    );

    for row in 0..rows {
        let number = |column: &str| location.value(row, column).and_then(Value::as_f64);
        let easting = number("easting");
        let northing = number("northing");
        let ground_level = number("ground_level_elevation");
        let base = ground_level
            .zip(number("depth_to_base"))
            .map(|(gl, depth)| gl - depth);

        let (geodetic, collar_geometry) = match (easting, northing) {
            (Some(e), Some(n)) => {
                let geodetic = match transform.to_geodetic(e, n, ground_level) {
                    Ok(geodetic) => Some(geodetic),
                    Err(err) => {
                        let uid = location
                            .value(row, LOCATION_UID)
                            .map(Value::to_string)
                            .unwrap_or_default();
                        diagnostics.push(
                            Diagnostic::new(
                                Stage::Derive,
                                Severity::Warning,
                                DiagnosticKind::ProjectionFailed,
                                format!(
                                    "location {} at ({}, {}) left without geodetic coordinates: {}",
                                    uid, e, n, err
                                ),
                            )
                            .in_table(location.name.clone())
                            .in_column("longitude"),
                        );
                        None
                    }
                };
                (geodetic, ground_level.map(|gl| Geometry::vertical(e, n, gl, base)))
            }
            _ => (None, None),
        };

        let lon = geodetic.map(|g| g.longitude);
        let lat = geodetic.map(|g| g.latitude);
        let h = geodetic.and_then(|g| g.ellipsoidal_height);

        elevation_at_base.push(Value::float_or_null(base));
        geometry.push(collar_geometry.map_or(Value::Null, |g| g.to_value()));
        longitude.push(Value::float_or_null(lon));
        latitude.push(Value::float_or_null(lat));
        height.push(Value::float_or_null(h));

        let point = match (lon, lat, h) {
            (Some(x), Some(y), Some(z)) => Geometry::PointZ(x, y, z).to_value(),
            (Some(x), Some(y), None) => Geometry::Point(x, y).to_value(),
            _ => Value::Null,
        };
        points.push_row(vec![
            location.value(row, PROJECT_UID).cloned().unwrap_or_default(),
            location.value(row, LOCATION_UID).cloned().unwrap_or_default(),
            Value::float_or_null(lon),
            Value::float_or_null(lat),
            Value::float_or_null(h),
            point,
        ]);
    }

    let location = location
        .clone()
        .with_column(
            ColumnSchema::derived("elevation_at_base", ColumnKind::Float),
            elevation_at_base,
        )
        .with_column(ColumnSchema::derived("geometry", ColumnKind::Geometry), geometry)
        .with_column(ColumnSchema::derived("longitude", ColumnKind::Float), longitude)
        .with_column(ColumnSchema::derived("latitude", ColumnKind::Float), latitude)
        .with_column(
            ColumnSchema::derived("wgs84_ground_level_height", ColumnKind::Float),
            height,
        );
    (location, points)
}

fn collars(location: &Table) -> HashMap<String, Collar> {
    (0..location.row_count())
        .filter_map(|row| {
            let uid = location.value(row, LOCATION_UID).filter(|v| !v.is_null())?;
            let number = |column: &str| location.value(row, column).and_then(Value::as_f64);
            Some((
                uid.to_string(),
                Collar {
                    easting: number("easting"),
                    northing: number("northing"),
                    ground_level: number("ground_level_elevation"),
                },
            ))
        })
        .collect()
}

/// Elevations and a vertical line (or point, without a base) for a table
/// with depths below its owning location.
fn derive_depth_geometry(table: &Table, collars: &HashMap<String, Collar>) -> Table {
    let rows = table.row_count();
    let mut elevation_at_top = Vec::with_capacity(rows);
    let mut elevation_at_base = Vec::with_capacity(rows);
    let mut geometry = Vec::with_capacity(rows);

    for row in 0..rows {
        let collar = table
            .value(row, LOCATION_UID)
            .and_then(|uid| collars.get(&uid.to_string()));
        let depth = |column: &str| table.value(row, column).and_then(Value::as_f64);
        let ground_level = collar.and_then(|c| c.ground_level);
        let top = ground_level
            .zip(depth("depth_to_top"))
            .map(|(gl, d)| gl - d);
        let base = ground_level
            .zip(depth("depth_to_base"))
            .map(|(gl, d)| gl - d);

        let shape = match (collar, top) {
            (
                Some(Collar {
                    easting: Some(e),
                    northing: Some(n),
                    ..
                }),
                Some(top),
            ) => Geometry::vertical(*e, *n, top, base).to_value(),
            _ => Value::Null,
        };

        elevation_at_top.push(Value::float_or_null(top));
        elevation_at_base.push(Value::float_or_null(base));
        geometry.push(shape);
    }

    table
        .clone()
        .with_column(
            ColumnSchema::derived("elevation_at_top", ColumnKind::Float),
            elevation_at_top,
        )
        .with_column(
            ColumnSchema::derived("elevation_at_base", ColumnKind::Float),
            elevation_at_base,
        )
        .with_column(ColumnSchema::derived("geometry", ColumnKind::Geometry), geometry)
}
