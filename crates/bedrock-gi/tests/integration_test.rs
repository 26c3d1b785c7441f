//! End-to-end tests of the ingestion pipeline.

use std::io::Write;
use std::path::PathBuf;

use tempfile::{NamedTempFile, TempDir};

use bedrock_gi::database::{LOCATION, SAMPLE};
use bedrock_gi::diagnostics::{DiagnosticKind, Severity, Stage};
use bedrock_gi::validation::{ViolationCategory, ViolationKind};
use bedrock_gi::{
    CanonicalDatabase, Crs, CrsId, EpsgRegistry, GiError, IngestConfig, Ingestor, Table, Value,
    derive_geometry, merge_databases, validate,
};

const UTM50: CrsId = CrsId(900_050);

const SITE: &str = include_str!("data/site.ags");

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/site.ags")
}

fn registry() -> EpsgRegistry {
    EpsgRegistry::new().with_definition(Crs::new(
        UTM50,
        "+proj=utm +zone=50 +datum=WGS84 +units=m +no_defs +type=crs",
        r#"PROJCS["WGS 84 / UTM zone 50N",GEOGCS["WGS 84"],PROJECTION["Transverse_Mercator"]]"#,
    ))
}

/// Route pipeline logs to the test harness; `RUST_LOG=bedrock_gi=debug` shows them.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_test_writer().compact())
        .try_init();
}

fn ingestor() -> Ingestor {
    init_tracing();
    Ingestor::new(IngestConfig::for_crs(UTM50)).with_registry(registry())
}

fn ingestor_with(config: IngestConfig) -> Ingestor {
    init_tracing();
    Ingestor::new(config).with_registry(registry())
}

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".ags").expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn text_column(table: &Table, column: &str) -> Vec<String> {
    table
        .column(column)
        .map(|values| values.map(Value::to_string).collect())
        .unwrap_or_default()
}

// =============================================================================
// Full pipeline
// =============================================================================

#[test]
fn test_full_pipeline() {
    let result = ingestor().ingest_file(fixture_path()).unwrap();
    let db = &result.database;

    assert_eq!(
        db.table_names(),
        vec![
            "Project",
            "Location",
            "LonLatHeight",
            "Sample",
            "InSitu_GEOL",
            "InSitu_ISPT",
            "Lab_CLSS",
            "ABBR",
        ]
    );

    assert_eq!(text_column(&db.project, "project_uid"), vec!["P1"]);
    assert_eq!(text_column(&db.project, "horizontal_crs"), vec!["EPSG:900050"]);
    assert_eq!(text_column(&db.project, "vertical_crs"), vec!["EPSG:3855"]);
    assert_eq!(text_column(&db.location, "location_uid"), vec!["BH1_P1", "BH2_P1"]);
    assert_eq!(result.source.file.as_deref(), Some("site.ags"));
    assert_eq!(result.source.group_count, 7);
}

#[test]
fn test_sample_keys() {
    let result = ingestor().ingest_str(SITE).unwrap();
    let sample = result.database.sample.as_ref().unwrap();

    assert_eq!(
        text_column(sample, "sample_uid"),
        vec!["A1_U_2.5_BH1_P1", "A2_D_6_BH1_P1", "B1_B_1_BH2_P1"]
    );
    assert_eq!(sample.value(1, "depth_to_base"), Some(&Value::Null));

    let lab = &result.database.lab["CLSS"];
    assert_eq!(text_column(lab, "sample_uid"), vec!["A1_U_2.5_BH1_P1"]);
    assert_eq!(text_column(lab, "location_uid"), vec!["BH1_P1"]);
    assert_eq!(lab.value(0, "CLSS_LL"), Some(&Value::Int(45)));
}

#[test]
fn test_parser_recovery() {
    let result = ingestor().ingest_str(SITE).unwrap();
    let geol = &result.database.in_situ["GEOL"];

    // The short BH2 line is dropped and the <CONT> line merged.
    assert_eq!(geol.row_count(), 3);
    assert_eq!(
        geol.value(1, "GEOL_DESC"),
        Some(&Value::from("Completely decomposed granite"))
    );
    assert_eq!(
        geol.value(2, "GEOL_DESC"),
        Some(&Value::from("Made ground, sandy"))
    );

    let skipped: Vec<_> = result.diagnostics.of_kind(DiagnosticKind::RowSkipped).collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].line, Some(27));
    assert_eq!(skipped[0].group.as_deref(), Some("GEOL"));
}

#[test]
fn test_multi_line_headers() {
    let result = ingestor().ingest_str(SITE).unwrap();
    let location = &result.database.location;

    assert!(location.has_column("HOLE_GL"));
    assert!(location.has_column("HOLE_REM"));
    assert_eq!(location.value(0, "ground_level_elevation"), Some(&Value::Float(5.2)));
    assert_eq!(location.value(1, "depth_to_base"), Some(&Value::Null));
}

#[test]
fn test_in_situ_depths() {
    let result = ingestor().ingest_str(SITE).unwrap();
    let ispt = &result.database.in_situ["ISPT"];

    assert_eq!(ispt.value(0, "depth_to_top"), Some(&Value::Float(1.5)));
    assert_eq!(ispt.value(0, "depth_to_base"), Some(&Value::Null));
    assert_eq!(ispt.value(1, "ISPT_NVAL"), Some(&Value::Int(25)));
}

#[test]
fn test_mapping_summary() {
    let result = ingestor().ingest_str(SITE).unwrap();
    let summary: Vec<_> = result
        .diagnostics
        .of_kind(DiagnosticKind::Summary)
        .filter(|d| d.stage == Stage::Map)
        .collect();

    assert_eq!(summary.len(), 1);
    assert!(summary[0].message.contains("2 locations, 3 samples"));
    assert!(summary[0].message.contains("In-Situ [GEOL, ISPT]"));
    assert!(summary[0].message.contains("Lab [CLSS]"));
}

#[test]
fn test_validation_summary() {
    let result = ingestor().ingest_str(SITE).unwrap();
    let validation: Vec<_> = result
        .diagnostics
        .entries()
        .iter()
        .filter(|d| d.stage == Stage::Validate)
        .collect();

    assert_eq!(validation.len(), 1);
    assert_eq!(validation[0].severity, Severity::Info);
    assert_eq!(validation[0].message, "validation passed: 0 violations");

    let unchecked = ingestor_with(IngestConfig {
        validate: false,
        ..IngestConfig::for_crs(UTM50)
    })
    .ingest_str(SITE)
    .unwrap();
    assert!(unchecked.diagnostics.entries().iter().all(|d| d.stage != Stage::Validate));
}

// =============================================================================
// Geometry
// =============================================================================

#[test]
fn test_derived_geometry() {
    let result = ingestor().ingest_str(SITE).unwrap();
    let db = &result.database;

    let base = db
        .location
        .value(0, "elevation_at_base")
        .and_then(Value::as_f64)
        .unwrap();
    assert!((base - (5.2 - 30.5)).abs() < 1e-9);

    let wkt = db.location.value(0, "geometry").and_then(Value::as_str).unwrap();
    assert!(wkt.starts_with("LINESTRING Z (208000 2470000 5.2, "));
    let wkt = db.location.value(1, "geometry").and_then(Value::as_str).unwrap();
    assert_eq!(wkt, "POINT Z (208050 2470025 5.45)");

    let lon = db.location.value(0, "longitude").and_then(Value::as_f64).unwrap();
    let lat = db.location.value(0, "latitude").and_then(Value::as_f64).unwrap();
    assert!((114.0..115.0).contains(&lon));
    assert!((22.0..23.0).contains(&lat));

    let points = db.lon_lat_height.as_ref().unwrap();
    assert_eq!(points.row_count(), 2);
    assert!(
        points
            .column("geometry")
            .unwrap()
            .all(|v| v.as_str().is_some_and(|wkt| wkt.starts_with("POINT (")))
    );
    assert_eq!(
        result.diagnostics.of_kind(DiagnosticKind::HeightOmitted).count(),
        1
    );

    let sample = db.sample.as_ref().unwrap();
    let top = sample.value(0, "elevation_at_top").and_then(Value::as_f64).unwrap();
    assert!((top - 2.7).abs() < 1e-9);
    let wkt = sample.value(1, "geometry").and_then(Value::as_str).unwrap();
    assert!(wkt.starts_with("POINT Z (208000 2470000 "));

    let geol = &db.in_situ["GEOL"];
    assert!(geol.has_column("elevation_at_top"));
    assert!(!db.lab["CLSS"].has_column("geometry"));
}

#[test]
fn test_unprojectable_location() {
    let text = SITE.replacen("\"208050.00\"", "\"1e12\"", 1);
    let result = ingestor().ingest_str(&text).unwrap();
    let db = &result.database;

    assert!(db.location.has_column("geometry"));
    let lon = db.location.value(0, "longitude").and_then(Value::as_f64).unwrap();
    assert!((114.0..115.0).contains(&lon));
    assert_eq!(db.location.value(1, "longitude"), Some(&Value::Null));
    assert_eq!(db.location.value(1, "latitude"), Some(&Value::Null));

    let sample = db.sample.as_ref().unwrap();
    assert!(sample.value(0, "geometry").and_then(Value::as_str).is_some());

    let failed: Vec<_> = result
        .diagnostics
        .of_kind(DiagnosticKind::ProjectionFailed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].stage, Stage::Derive);
    assert!(failed[0].message.contains("BH2_P1"));
    assert_eq!(
        result.diagnostics.of_kind(DiagnosticKind::DerivationSkipped).count(),
        0
    );
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_mapping_is_idempotent() {
    let config = IngestConfig {
        derive_geometry: false,
        ..IngestConfig::for_crs(UTM50)
    };
    let first = ingestor_with(config.clone()).ingest_str(SITE).unwrap();
    let second = ingestor_with(config).ingest_str(SITE).unwrap();

    assert_eq!(first.database, second.database);
    assert_eq!(
        first.database.to_json().unwrap(),
        second.database.to_json().unwrap()
    );
    assert_eq!(first.source.hash, second.source.hash);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_empty_input() {
    for text in ["", "\n\n   \n"] {
        let err = ingestor().ingest_str(text).unwrap_err();
        assert!(matches!(err, GiError::Format { .. }), "got {err}");
    }
}

#[test]
fn test_not_ags() {
    let err = ingestor().ingest_str("sample_id,depth\nS1,2.5\n").unwrap_err();
    match err {
        GiError::Format { line, .. } => assert_eq!(line, 1),
        other => panic!("expected Format error, got {other}"),
    }
}

#[test]
fn test_missing_project_group() {
    let text = SITE.replacen("\"**PROJ\"", "\"**PROX\"", 1);
    let err = ingestor().ingest_str(&text).unwrap_err();
    assert!(matches!(err, GiError::MissingRequiredGroup { ref group } if group == "PROJ"));
}

#[test]
fn test_sample_with_unknown_location() {
    let text = SITE.replace("\"BH2\",\"1.00\",\"B1\"", "\"BH7\",\"1.00\",\"B1\"");
    let err = ingestor().ingest_str(&text).unwrap_err();
    match err {
        GiError::UnknownLocation { group, location_ids } => {
            assert_eq!(group, "SAMP");
            assert_eq!(location_ids, vec!["BH7"]);
        }
        other => panic!("expected UnknownLocation, got {other}"),
    }
}

#[test]
fn test_in_situ_foreign_key_violation() {
    let text = SITE.replace("\"BH1\",\"4.50\",\"25\"", "\"BH9\",\"4.50\",\"25\"");
    let err = ingestor().ingest_str(&text).unwrap_err();

    let GiError::Validation(report) = err else {
        panic!("expected a validation error");
    };
    let violations: Vec<_> = report.for_table("InSitu_ISPT").collect();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::ForeignKey);
    assert_eq!(violations[0].column.as_deref(), Some("location_uid"));
    assert_eq!(violations[0].rows, vec![1]);
    assert_eq!(violations[0].values, vec!["BH9_P1"]);
}

#[test]
fn test_sample_foreign_key_violation() {
    let config = IngestConfig {
        derive_geometry: false,
        ..IngestConfig::for_crs(UTM50)
    };
    let mut db = ingestor_with(config).ingest_str(SITE).unwrap().database;
    let mut sample = db.sample.take().unwrap();
    let mut row: Vec<Value> = sample
        .column_names()
        .iter()
        .map(|c| sample.value(0, c).cloned().unwrap_or_default())
        .collect();
    row[0] = Value::from("Z9_U_1_BH404_P1");
    row[3] = Value::from("BH404_P1");
    sample.push_row(row);
    db.sample = Some(sample);

    let report = validate(&db);
    assert!(!report.is_valid());
    let fk: Vec<_> = report.of_category(ViolationCategory::ForeignKeyViolation).collect();
    assert_eq!(fk.len(), 1);
    assert_eq!(fk[0].table, SAMPLE);
    assert_eq!(fk[0].rows, vec![3]);
    assert!(fk[0].message.contains(LOCATION));
    assert!(fk[0].to_string().contains("BH404_P1"));
}

#[test]
fn test_validation_disabled() {
    let text = SITE.replace("\"BH1\",\"4.50\",\"25\"", "\"BH9\",\"4.50\",\"25\"");
    let config = IngestConfig {
        validate: false,
        ..IngestConfig::for_crs(UTM50)
    };
    let result = ingestor_with(config).ingest_str(&text).unwrap();
    assert!(!validate(&result.database).is_valid());

    // BH9 has no collar, so its test has no geometry.
    let ispt = &result.database.in_situ["ISPT"];
    assert_eq!(ispt.value(1, "geometry"), Some(&Value::Null));
}

#[test]
fn test_unknown_crs() {
    let err = Ingestor::new(IngestConfig::for_crs(CrsId(999_999)))
        .ingest_str(SITE)
        .unwrap_err();
    assert!(matches!(err, GiError::UnknownCrs { .. }));
}

// =============================================================================
// Merging
// =============================================================================

fn second_project() -> String {
    SITE.replacen("\"P1\"", "\"P2\"", 1)
}

#[test]
fn test_ingest_all() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("p1.ags");
    let second = dir.path().join("p2.ags");
    std::fs::write(&first, SITE).unwrap();
    std::fs::write(&second, second_project()).unwrap();

    let batch = ingestor().ingest_all(&[first, second]).unwrap();
    let db = &batch.database;

    assert_eq!(db.project_uids(), vec!["P1", "P2"]);
    assert_eq!(db.location.row_count(), 4);
    assert_eq!(db.sample.as_ref().unwrap().row_count(), 6);
    assert_eq!(db.lon_lat_height.as_ref().unwrap().row_count(), 4);
    assert_eq!(batch.sources.len(), 2);
    assert_eq!(batch.sources[1].file.as_deref(), Some("p2.ags"));
    let stage_summaries = |stage: Stage| {
        batch
            .diagnostics
            .of_kind(DiagnosticKind::Summary)
            .filter(|d| d.stage == stage)
            .count()
    };
    assert_eq!(stage_summaries(Stage::Map), 2);
    // One per source plus the merged database.
    assert_eq!(stage_summaries(Stage::Validate), 3);
}

#[test]
fn test_ingest_all_duplicate_project() {
    let first = create_test_file(SITE);
    let second = create_test_file(SITE);

    let err = ingestor()
        .ingest_all(&[first.path(), second.path()])
        .unwrap_err();
    let GiError::Validation(report) = err else {
        panic!("expected a validation error");
    };
    assert!(
        report
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::DuplicateKey && v.table == "Project")
    );
}

#[test]
fn test_ingest_all_empty() {
    let paths: [PathBuf; 0] = [];
    assert!(matches!(
        ingestor().ingest_all(&paths).unwrap_err(),
        GiError::Config(_)
    ));
}

fn mapped_with(horizontal: CrsId, text: &str) -> CanonicalDatabase {
    let registry = registry().with_definition(Crs::new(
        CrsId(900_051),
        "+proj=utm +zone=51 +datum=WGS84 +units=m +no_defs",
        "PROJCS[\"WGS 84 / UTM zone 51N\"]",
    ));
    let config = IngestConfig {
        derive_geometry: false,
        ..IngestConfig::for_crs(horizontal)
    };
    Ingestor::new(config)
        .with_registry(registry)
        .ingest_str(text)
        .unwrap()
        .database
}

#[test]
fn test_merged_projects_with_different_crs() {
    let first = mapped_with(UTM50, SITE);
    let second = mapped_with(CrsId(900_051), &second_project());
    let merged = merge_databases(&first, &second).unwrap();

    let mut diagnostics = bedrock_gi::Diagnostics::new();
    let err = derive_geometry(&merged, &registry(), &mut diagnostics).unwrap_err();
    assert!(err.is_derivation_only());
    match err {
        GiError::AmbiguousCrs { found } => {
            assert_eq!(found.len(), 2);
            assert!(found[0].starts_with("EPSG:900050"));
        }
        other => panic!("expected AmbiguousCrs, got {other}"),
    }
}

#[test]
fn test_file_not_found() {
    let err = ingestor().ingest_file("/nonexistent/site.ags").unwrap_err();
    assert!(matches!(err, GiError::Io { .. }));
}

#[test]
fn test_warnings_do_not_fail_ingestion() {
    let text = format!("\"<CONT>\",\"orphan\"\n{}", SITE);
    let result = ingestor().ingest_str(&text);
    // Data before the first group line means detection fails.
    assert!(matches!(result, Err(GiError::Format { .. })));

    // Without HOLE every location reference dangles, so only mapping is checked.
    let text = SITE.replacen("\"**HOLE\"", "\"**HOLX\"", 1);
    let config = IngestConfig {
        validate: false,
        ..IngestConfig::for_crs(UTM50)
    };
    let result = ingestor_with(config).ingest_str(&text);
    assert!(matches!(result, Err(GiError::UnknownLocation { .. })));

    let text = text.replacen("\"**SAMP\"", "\"**SAMX\"", 1);
    let config = IngestConfig {
        validate: false,
        ..IngestConfig::for_crs(UTM50)
    };
    let result = ingestor_with(config).ingest_str(&text).unwrap();
    assert_eq!(result.database.location.row_count(), 0);
    assert!(result.diagnostics.count_at_least(Severity::Warning) >= 1);
    assert!(
        result
            .diagnostics
            .of_kind(DiagnosticKind::MissingOptionalGroup)
            .any(|d| d.message.contains("HOLE"))
    );
}
