//! Mapping of decoded AGS groups to the canonical database.

use std::collections::HashSet;

use indexmap::IndexSet;
use tracing::info;

use super::depth::resolve_depth_columns;
use super::dialect::Dialect;
use super::keys::{SampleKeyColumns, location_uid, sample_uid};
use crate::database::{CanonicalDatabase, LOCATION, SAMPLE, canonical_columns};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity, Stage};
use crate::error::{GiError, Result};
use crate::geo::CrsPair;
use crate::table::{ColumnSchema, GroupMap, GroupTable, Table, TableKind, TableSchema, Value};

/// Map decoded groups to a canonical database.
///
/// Order matters: Project first (mandatory, exactly one row), then Location,
/// then Sample, whose location ids must already exist in Location. Every
/// remaining group becomes a Lab table if it has a sample reference column,
/// an In-Situ table if it has a location id column, or an Other table.
/// Groups lacking a column their category needs fall back to Other.
///
/// Source groups are not modified; every canonical table owns copies of the
/// cells it uses.
pub fn map_groups(
    groups: &GroupMap,
    dialect: &Dialect,
    crs: &CrsPair,
    diagnostics: &mut Diagnostics,
) -> Result<CanonicalDatabase> {
    info!(version = %dialect.version, groups = groups.len(), "mapping groups");

    let project_group =
        groups
            .get(dialect.project_group)
            .ok_or_else(|| GiError::MissingRequiredGroup {
                group: dialect.project_group.to_string(),
            })?;
    let (project, project_uid) = map_project(project_group, dialect, crs)?;

    let mut db = CanonicalDatabase::empty();
    db.project = project;
    let mut consumed = vec![dialect.project_group];

    // Location
    let mut known_locations = HashSet::new();
    consumed.push(dialect.location_group);
    match groups.get(dialect.location_group) {
        Some(group) if group.has_column(dialect.location_id) => {
            if let Some(ids) = group.column(dialect.location_id) {
                known_locations.extend(ids.map(Value::key_fragment));
            }
            db.location = map_location(group, dialect, &project_uid);
        }
        Some(group) => degrade(
            &mut db,
            group,
            format!("no {} column, Location left empty", dialect.location_id),
            diagnostics,
        ),
        None => diagnostics.warn(
            Stage::Map,
            DiagnosticKind::MissingOptionalGroup,
            format!(
                "no {} group, i.e. no ground investigation locations; Location left empty",
                dialect.location_group
            ),
        ),
    }

    // Sample
    consumed.push(dialect.sample_group);
    match groups.get(dialect.sample_group) {
        Some(group) => match sample_keys(group, dialect) {
            Some(keys) => {
                check_locations(group, &keys, &known_locations)?;
                db.sample = Some(map_sample(group, &keys, dialect, &project_uid));
            }
            None => degrade(
                &mut db,
                group,
                format!(
                    "needs {} and {} columns to build sample keys",
                    dialect.sample_top, dialect.location_id
                ),
                diagnostics,
            ),
        },
        None => diagnostics.info(
            Stage::Map,
            DiagnosticKind::MissingOptionalGroup,
            format!("no {} group, i.e. no samples", dialect.sample_group),
        ),
    }

    // Lab, In-Situ and Other
    for (name, group) in groups {
        if consumed.contains(&name.as_str()) {
            continue;
        }

        if group.has_column(dialect.sample_reference) {
            match sample_keys(group, dialect) {
                Some(keys) => {
                    let lab = map_lab(group, &keys, &project_uid);
                    db.lab.insert(name.clone(), lab);
                }
                None => degrade(
                    &mut db,
                    group,
                    format!(
                        "lab group needs {} and {} columns",
                        dialect.sample_top, dialect.location_id
                    ),
                    diagnostics,
                ),
            }
        } else if group.has_column(dialect.location_id) {
            match resolve_depth_columns(dialect.depth_rules, group) {
                Ok(depths) => {
                    if depths.fell_back {
                        diagnostics.push(
                            Diagnostic::new(
                                Stage::Map,
                                Severity::Warning,
                                DiagnosticKind::DepthFallback,
                                format!(
                                    "no top depth heading, using '{}' as depth_to_top",
                                    depths.top
                                ),
                            )
                            .in_group(name.clone())
                            .in_column(depths.top.clone()),
                        );
                    }
                    let in_situ = map_in_situ(
                        group,
                        dialect,
                        &depths.top,
                        depths.base.as_deref(),
                        &project_uid,
                    );
                    db.in_situ.insert(name.clone(), in_situ);
                }
                Err(missing) => degrade(
                    &mut db,
                    group,
                    format!("no '{}' depth heading", missing.expected_top),
                    diagnostics,
                ),
            }
        } else {
            db.other
                .insert(name.clone(), Table::from_group(group, TableKind::Other));
        }
    }

    diagnostics.info(
        Stage::Map,
        DiagnosticKind::Summary,
        format!(
            "project {}: {} locations, {} samples; In-Situ [{}]; Lab [{}]; Other [{}]",
            project_uid,
            db.location.row_count(),
            db.sample.as_ref().map_or(0, Table::row_count),
            join_keys(db.in_situ.keys()),
            join_keys(db.lab.keys()),
            join_keys(db.other.keys()),
        ),
    );
    Ok(db)
}

fn map_project(group: &GroupTable, dialect: &Dialect, crs: &CrsPair) -> Result<(Table, String)> {
    if group.row_count() != 1 {
        return Err(GiError::ProjectRowCount {
            group: group.name.clone(),
            rows: group.row_count(),
        });
    }

    let declared = |column: &str| group.get(0, column).filter(|v| !v.is_null());
    let project_uid = declared("project_uid")
        .or_else(|| declared(dialect.project_id))
        .map(Value::to_string)
        .ok_or_else(|| GiError::MissingProjectId {
            group: group.name.clone(),
        })?;

    let table = build_table(crate::database::PROJECT, TableKind::Project, group, |_| {
        vec![
            Value::from(project_uid.as_str()),
            Value::from(crs.horizontal.id.to_string()),
            Value::from(crs.horizontal.wkt.as_str()),
            Value::from(crs.vertical.id.to_string()),
            Value::from(crs.vertical.wkt.as_str()),
        ]
    });
    Ok((table, project_uid))
}

fn map_location(group: &GroupTable, dialect: &Dialect, project_uid: &str) -> Table {
    let id = group.column_index(dialect.location_id);
    let location_type = group.column_index(dialect.location_type);
    let easting = group.column_index(dialect.easting);
    let northing = group.column_index(dialect.northing);
    let ground_level = group.column_index(dialect.ground_level);
    let final_depth = group.column_index(dialect.final_depth);

    build_table(LOCATION, TableKind::Location, group, |row| {
        let location_id = cell(row, id);
        vec![
            Value::from(location_uid(&location_id, project_uid)),
            location_id,
            Value::from(project_uid),
            cell(row, location_type),
            cell(row, easting),
            cell(row, northing),
            cell(row, ground_level),
            cell(row, final_depth),
        ]
    })
}

fn sample_keys(group: &GroupTable, dialect: &Dialect) -> Option<SampleKeyColumns> {
    SampleKeyColumns::locate(
        group,
        dialect.sample_reference,
        dialect.sample_type,
        dialect.sample_top,
        dialect.location_id,
    )
}

/// Every location id in `group` must be a known location.
fn check_locations(
    group: &GroupTable,
    keys: &SampleKeyColumns,
    known: &HashSet<String>,
) -> Result<()> {
    let unknown: IndexSet<String> = group
        .rows
        .iter()
        .map(|row| keys.location(row).key_fragment())
        .filter(|id| !known.contains(id))
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(GiError::UnknownLocation {
            group: group.name.clone(),
            location_ids: unknown.into_iter().collect(),
        })
    }
}

fn map_sample(
    group: &GroupTable,
    keys: &SampleKeyColumns,
    dialect: &Dialect,
    project_uid: &str,
) -> Table {
    let base = group.column_index(dialect.sample_base);

    build_table(SAMPLE, TableKind::Sample, group, |row| {
        let source_id = keys.source_id(row);
        let location_id = keys.location(row);
        vec![
            Value::from(sample_uid(&source_id, project_uid)),
            Value::from(source_id),
            Value::from(project_uid),
            Value::from(location_uid(location_id, project_uid)),
            location_id.clone(),
            keys.top(row).clone(),
            cell(row, base),
        ]
    })
}

fn map_lab(group: &GroupTable, keys: &SampleKeyColumns, project_uid: &str) -> Table {
    build_table(&group.name, TableKind::Lab, group, |row| {
        vec![
            Value::from(project_uid),
            Value::from(sample_uid(&keys.source_id(row), project_uid)),
            Value::from(location_uid(keys.location(row), project_uid)),
        ]
    })
}

fn map_in_situ(
    group: &GroupTable,
    dialect: &Dialect,
    top: &str,
    base: Option<&str>,
    project_uid: &str,
) -> Table {
    let id = group.column_index(dialect.location_id);
    let top = group.column_index(top);
    let base = base.and_then(|b| group.column_index(b));

    build_table(&group.name, TableKind::InSitu, group, |row| {
        vec![
            Value::from(project_uid),
            Value::from(location_uid(&cell(row, id), project_uid)),
            cell(row, top),
            cell(row, base),
        ]
    })
}

/// Canonical columns of `kind` filled by `canonical`, followed by every
/// source column whose name is not already canonical.
fn build_table(
    name: &str,
    kind: TableKind,
    group: &GroupTable,
    mut canonical: impl FnMut(&[Value]) -> Vec<Value>,
) -> Table {
    let mut columns = canonical_columns(kind);
    let passthrough: Vec<usize> = group
        .headers
        .iter()
        .enumerate()
        .filter(|(_, header)| !columns.iter().any(|c| &c.name == *header))
        .map(|(i, _)| i)
        .collect();
    columns.extend(
        passthrough
            .iter()
            .map(|&i| ColumnSchema::source(group.headers[i].as_str())),
    );

    let mut table = Table::new(name, kind, TableSchema::with_columns(columns));
    for row in &group.rows {
        let mut values = canonical(row);
        values.extend(passthrough.iter().map(|&i| cell(row, Some(i))));
        table.push_row(values);
    }
    table
}

fn degrade(
    db: &mut CanonicalDatabase,
    group: &GroupTable,
    reason: String,
    diagnostics: &mut Diagnostics,
) {
    diagnostics.push(
        Diagnostic::new(
            Stage::Map,
            Severity::Warning,
            DiagnosticKind::DegradedGroup,
            format!("{} kept as an Other table: {}", group.name, reason),
        )
        .in_group(group.name.clone()),
    );
    db.other
        .insert(group.name.clone(), Table::from_group(group, TableKind::Other));
}

fn cell(row: &[Value], index: Option<usize>) -> Value {
    index
        .and_then(|i| row.get(i))
        .cloned()
        .unwrap_or_default()
}

fn join_keys<'a>(keys: impl Iterator<Item = &'a String>) -> String {
    keys.map(String::as_str).collect::<Vec<_>>().join(", ")
}
