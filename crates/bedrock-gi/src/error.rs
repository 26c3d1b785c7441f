//! Error types for the Bedrock GI library.

use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// Main error type for ingestion, mapping, validation and geometry derivation.
#[derive(Debug, Error)]
pub enum GiError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input does not follow the AGS grammar at all.
    #[error("Format error at line {line}: {message}")]
    Format { line: usize, message: String },

    /// A group the mapping cannot do without is absent.
    #[error("Missing required group '{group}'")]
    MissingRequiredGroup { group: String },

    /// The project group must hold exactly one row.
    #[error("The {group} group must contain exactly one row, found {rows}")]
    ProjectRowCount { group: String, rows: usize },

    /// The project group has no usable project identifier.
    #[error("The project ID is missing from the {group} group")]
    MissingProjectId { group: String },

    /// A group references locations that the location group does not define.
    #[error("Group '{group}' references unknown locations: {}", .location_ids.join(", "))]
    UnknownLocation {
        group: String,
        location_ids: Vec<String>,
    },

    /// The canonical database violates its schema or referential integrity.
    #[error("Validation failed with {} violation(s)", .0.violations.len())]
    Validation(ValidationReport),

    /// More than one CRS is present across the project rows.
    #[error("All projects must share one CRS, found {}: {}", .found.len(), .found.join(" | "))]
    AmbiguousCrs { found: Vec<String> },

    /// The CRS registry has no definition for this identifier.
    #[error("Unknown CRS: {id}")]
    UnknownCrs { id: String },

    /// A CRS identifier could not be parsed.
    #[error("Invalid CRS identifier: {0}")]
    InvalidCrsId(String),

    /// A coordinate operation failed.
    #[error("Projection error: {0}")]
    Projection(String),

    /// Input format recognised but not handled by any configured decoder.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GiError {
    /// Shorthand for a format error at a 1-based line number.
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        GiError::Format {
            line,
            message: message.into(),
        }
    }

    /// Returns true if the error only concerns geometry derivation.
    ///
    /// Parsing and mapping results remain usable when this is true.
    pub fn is_derivation_only(&self) -> bool {
        matches!(
            self,
            GiError::AmbiguousCrs { .. } | GiError::Projection(_)
        )
    }
}

/// Result type alias for Bedrock GI operations.
pub type Result<T> = std::result::Result<T, GiError>;
