//! The ingestion pipeline and its configuration.

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ags::{
    Ags3Parser, AgsVersion, GroupDecoder, ParserConfig, SourceMetadata, detect_ags_version,
};
use crate::database::{CanonicalDatabase, merge_databases};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity, Stage};
use crate::error::{GiError, Result};
use crate::geo::{CrsId, CrsPair, CrsRegistry, EGM2008_HEIGHT, EpsgRegistry, derive_geometry};
use crate::mapping::{Dialect, map_groups};
use crate::validation::{ValidationEngine, ValidationMode, ValidationReport};

/// Configuration for one or more ingestion runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// CRS of the easting and northing columns. Required.
    pub horizontal_crs: Option<CrsId>,
    /// CRS of ground level elevations.
    ///
    /// Ellipsoidal heights (`wgs84_ground_level_height` and the Z of
    /// LonLatHeight points) need a geoid model for this CRS in the
    /// ingestor's registry. No model ships for the default EGM2008 height,
    /// so heights stay null until one is registered with
    /// [`EpsgRegistry::with_geoid`].
    pub vertical_crs: CrsId,
    /// Add elevations, geodetic coordinates and geometries after validation.
    pub derive_geometry: bool,
    /// Validate the mapped database before returning it.
    pub validate: bool,
    /// Drop parsed columns in which every value is null.
    pub drop_null_columns: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            horizontal_crs: None,
            vertical_crs: EGM2008_HEIGHT,
            derive_geometry: true,
            validate: true,
            drop_null_columns: true,
        }
    }
}

impl IngestConfig {
    /// Configuration for a horizontal CRS with every other setting defaulted.
    pub fn for_crs(horizontal_crs: CrsId) -> Self {
        Self {
            horizontal_crs: Some(horizontal_crs),
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| GiError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Result of ingesting one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResult {
    /// The mapped (and possibly derived) database.
    pub database: CanonicalDatabase,
    /// Everything recorded while ingesting.
    pub diagnostics: Diagnostics,
    /// Metadata about the source text.
    pub source: SourceMetadata,
}

/// Result of ingesting several sources into one database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestBatch {
    pub database: CanonicalDatabase,
    pub diagnostics: Diagnostics,
    /// Source metadata in input order.
    pub sources: Vec<SourceMetadata>,
}

/// Runs detection, decoding, mapping, validation and derivation.
pub struct Ingestor {
    config: IngestConfig,
    parser: Ags3Parser,
    registry: Arc<dyn CrsRegistry>,
    ags4_decoder: Option<Arc<dyn GroupDecoder>>,
}

impl Ingestor {
    /// Create an ingestor using the EPSG registry.
    ///
    /// The default registry has no geoid models, so derived ellipsoidal
    /// heights are null and a `HeightOmitted` warning is recorded. Pass a
    /// registry with a geoid for the vertical CRS to
    /// [`Ingestor::with_registry`] to fill them.
    pub fn new(config: IngestConfig) -> Self {
        let parser = Ags3Parser::with_config(ParserConfig {
            drop_null_columns: config.drop_null_columns,
        });
        Self {
            config,
            parser,
            registry: Arc::new(EpsgRegistry::new()),
            ags4_decoder: None,
        }
    }

    /// Resolve CRSs and geoid models through `registry`.
    pub fn with_registry(mut self, registry: impl CrsRegistry + 'static) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Decode AGS 4 input with `decoder`.
    ///
    /// Without one, AGS 4 input fails with [`GiError::UnsupportedFormat`].
    pub fn with_ags4_decoder(mut self, decoder: impl GroupDecoder + 'static) -> Self {
        self.ags4_decoder = Some(Arc::new(decoder));
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest AGS text already held in memory.
    pub fn ingest_str(&self, text: &str) -> Result<IngestResult> {
        let mut diagnostics = Diagnostics::new();
        let (database, source) = self.map_text(text, &mut diagnostics)?;
        let database = self.derive(database, &mut diagnostics)?;
        Ok(IngestResult {
            database,
            diagnostics,
            source,
        })
    }

    /// Read and ingest one file.
    pub fn ingest_file(&self, path: impl AsRef<Path>) -> Result<IngestResult> {
        let path = path.as_ref();
        let text = read_source(path)?;
        let mut result = self.ingest_str(&text)?;
        result.source = result.source.with_path(path);
        Ok(result)
    }

    /// Ingest independent files in parallel and merge them.
    ///
    /// Each file is mapped (and validated, if configured) on its own. The
    /// merged database is always re-validated, and geometry is derived once
    /// on the merged result.
    pub fn ingest_all<P>(&self, paths: &[P]) -> Result<IngestBatch>
    where
        P: AsRef<Path> + Sync,
    {
        let mapped = paths
            .par_iter()
            .map(|path| {
                let path = path.as_ref();
                let text = read_source(path)?;
                let mut diagnostics = Diagnostics::new();
                let (database, source) = self.map_text(&text, &mut diagnostics)?;
                Ok((database, source.with_path(path), diagnostics))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut mapped = mapped.into_iter();
        let Some((mut database, first_source, mut diagnostics)) = mapped.next() else {
            return Err(GiError::Config("no sources to ingest".to_string()));
        };
        let mut sources = vec![first_source];
        for (next, source, next_diagnostics) in mapped {
            database = merge_databases(&database, &next)?;
            sources.push(source);
            diagnostics.extend(next_diagnostics);
        }
        if sources.len() > 1 {
            diagnostics.info(
                Stage::Validate,
                DiagnosticKind::Summary,
                format!("validation passed: merged database of {} sources", sources.len()),
            );
        }

        info!(sources = sources.len(), "ingested batch");
        let database = self.derive(database, &mut diagnostics)?;
        Ok(IngestBatch {
            database,
            diagnostics,
            sources,
        })
    }

    fn map_text(
        &self,
        text: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<(CanonicalDatabase, SourceMetadata)> {
        let crs = self.crs_pair()?;
        let version = detect_ags_version(text)?;
        let decoder: &dyn GroupDecoder = match version {
            AgsVersion::Ags3 => &self.parser,
            AgsVersion::Ags4 => self.ags4_decoder.as_deref().ok_or_else(|| {
                GiError::UnsupportedFormat("AGS 4 input requires an AGS 4 decoder".to_string())
            })?,
        };

        let groups = decoder.decode(text, diagnostics)?;
        let source = SourceMetadata::from_text(text, version, groups.len());
        let database = map_groups(&groups, Dialect::for_version(version), &crs, diagnostics)?;

        if self.config.validate {
            let report = ValidationEngine::new(ValidationMode::SingleProject).validate(&database);
            record_validation(&report, diagnostics);
            report.into_result()?;
        }
        Ok((database, source))
    }

    fn crs_pair(&self) -> Result<CrsPair> {
        let horizontal = self
            .config
            .horizontal_crs
            .ok_or_else(|| GiError::Config("a horizontal CRS is required".to_string()))?;
        CrsPair::resolve(
            self.registry.as_ref(),
            &horizontal,
            &self.config.vertical_crs,
        )
    }

    /// Derive geometry if configured, keeping the underived database when
    /// only derivation fails.
    fn derive(
        &self,
        database: CanonicalDatabase,
        diagnostics: &mut Diagnostics,
    ) -> Result<CanonicalDatabase> {
        if !self.config.derive_geometry {
            return Ok(database);
        }
        match derive_geometry(&database, self.registry.as_ref(), diagnostics) {
            Ok(derived) => Ok(derived),
            Err(err) if err.is_derivation_only() => {
                diagnostics.push(Diagnostic::new(
                    Stage::Derive,
                    Severity::Error,
                    DiagnosticKind::DerivationSkipped,
                    err.to_string(),
                ));
                Ok(database)
            }
            Err(err) => Err(err),
        }
    }
}

fn record_validation(report: &ValidationReport, diagnostics: &mut Diagnostics) {
    let (severity, outcome) = if report.is_valid() {
        (Severity::Info, "passed")
    } else {
        (Severity::Error, "failed")
    };
    diagnostics.push(Diagnostic::new(
        Stage::Validate,
        severity,
        DiagnosticKind::Summary,
        format!("validation {}: {} violations", outcome, report.violations.len()),
    ));
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| GiError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
