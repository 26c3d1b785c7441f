//! Bedrock GI: ingest AGS ground investigation data into a relational database.
//!
//! AGS text is parsed into grouped tables, mapped onto a fixed cross-project
//! schema (Project, Location, Sample, In-Situ, Lab and Other tables),
//! validated for schema conformance and referential integrity, and enriched
//! with elevations, geodetic coordinates and WKT geometry.
//!
//! # Core Principles
//!
//! - **Typed tables**: every cell is a [`Value`] and every canonical table
//!   carries a [`TableSchema`]
//! - **Collect, then fail once**: recoverable problems are recorded as
//!   [`Diagnostic`]s and validation reports every violation together
//! - **Immutable stages**: each stage returns new tables instead of editing
//!   its input
//!
//! # Example
//!
//! ```no_run
//! use bedrock_gi::{CrsId, IngestConfig, Ingestor};
//!
//! let ingestor = Ingestor::new(IngestConfig::for_crs(CrsId(2326)));
//! let result = ingestor.ingest_file("site_investigation.ags").unwrap();
//!
//! for (name, table) in result.database.tables() {
//!     println!("{}: {} rows", name, table.row_count());
//! }
//! println!("Diagnostics: {}", result.diagnostics.len());
//! ```

pub mod ags;
pub mod database;
pub mod diagnostics;
pub mod error;
pub mod geo;
pub mod mapping;
pub mod table;
pub mod validation;

mod ingest;

pub use crate::ingest::{IngestBatch, IngestConfig, IngestResult, Ingestor};
pub use ags::{Ags3Parser, AgsVersion, GroupDecoder, SourceMetadata, detect_ags_version};
pub use database::{CanonicalDatabase, merge_databases};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity, Stage};
pub use error::{GiError, Result};
pub use geo::{Crs, CrsId, CrsRegistry, EpsgRegistry, GeoidModel, derive_geometry};
pub use mapping::map_groups;
pub use table::{GroupMap, GroupTable, Table, TableKind, TableSchema, Value};
pub use validation::{ValidationReport, Violation, ViolationCategory, validate};
