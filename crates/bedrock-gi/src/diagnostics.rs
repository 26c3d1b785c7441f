//! Advisory diagnostics collected while ingesting.
//!
//! Each pipeline stage receives a `&mut Diagnostics` and records what it
//! skipped, degraded or could not derive. Recording also forwards the entry
//! to `tracing`, so a host with a subscriber installed sees the same text.
//! Diagnostics never decide control flow: errors are returned as
//! [`GiError`](crate::GiError) values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Pipeline stage that recorded a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Parse,
    Map,
    Validate,
    Derive,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Map => "map",
            Stage::Validate => "validate",
            Stage::Derive => "derive",
        }
    }
}

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Progress information.
    Info,
    /// Something was skipped or degraded; the result is still usable.
    Warning,
    /// Something is wrong with the data.
    Error,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A data line whose field count disagrees with the header count.
    RowSkipped,
    /// A continuation line with no row before it.
    OrphanContinuation,
    /// A data or header line before any group-start line.
    DataOutsideGroup,
    /// A group name appeared more than once in one stream.
    RepeatedGroup,
    /// A group fell back to an Other table.
    DegradedGroup,
    /// An optional group is absent.
    MissingOptionalGroup,
    /// A depth column was substituted for a missing one.
    DepthFallback,
    /// A location's coordinates could not be transformed to WGS 84.
    ProjectionFailed,
    /// Ellipsoidal height could not be computed.
    HeightOmitted,
    /// Geometry derivation failed; tables are returned without it.
    DerivationSkipped,
    /// Stage summary or progress.
    Summary,
}

impl DiagnosticKind {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::RowSkipped => "Row Skipped",
            DiagnosticKind::OrphanContinuation => "Orphan Continuation",
            DiagnosticKind::DataOutsideGroup => "Data Outside Group",
            DiagnosticKind::RepeatedGroup => "Repeated Group",
            DiagnosticKind::DegradedGroup => "Degraded Group",
            DiagnosticKind::MissingOptionalGroup => "Missing Optional Group",
            DiagnosticKind::DepthFallback => "Depth Fallback",
            DiagnosticKind::ProjectionFailed => "Projection Failed",
            DiagnosticKind::HeightOmitted => "Height Omitted",
            DiagnosticKind::DerivationSkipped => "Derivation Skipped",
            DiagnosticKind::Summary => "Summary",
        }
    }
}

/// One advisory message with enough context to locate its cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Human-readable description.
    pub message: String,
    /// 1-based line number in the source text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Source group name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Canonical table name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// When recorded.
    pub recorded_at: DateTime<Utc>,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(
        stage: Stage,
        severity: Severity,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            severity,
            kind,
            message: message.into(),
            line: None,
            group: None,
            table: None,
            column: None,
            recorded_at: Utc::now(),
        }
    }

    /// Set the source line.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Set the source group.
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set the canonical table.
    pub fn in_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set the column.
    pub fn in_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    fn location(&self) -> String {
        let mut parts = Vec::new();
        if let Some(line) = self.line {
            parts.push(format!("line {}", line));
        }
        if let Some(group) = &self.group {
            parts.push(format!("group {}", group));
        }
        if let Some(table) = &self.table {
            parts.push(format!("table {}", table));
        }
        if let Some(column) = &self.column {
            parts.push(format!("column {}", column));
        }
        parts.join(", ")
    }
}

/// Ordered collection of diagnostics for one ingestion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and forward it to `tracing`.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        let stage = diagnostic.stage.label();
        let kind = diagnostic.kind.label();
        let at = diagnostic.location();
        match diagnostic.severity {
            Severity::Info => info!(stage, kind, at = %at, "{}", diagnostic.message),
            Severity::Warning | Severity::Error => {
                warn!(stage, kind, at = %at, "{}", diagnostic.message)
            }
        }
        self.entries.push(diagnostic);
    }

    /// Record an info-level diagnostic.
    pub fn info(&mut self, stage: Stage, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(Diagnostic::new(stage, Severity::Info, kind, message));
    }

    /// Record a warning-level diagnostic.
    pub fn warn(&mut self, stage: Stage, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(Diagnostic::new(stage, Severity::Warning, kind, message));
    }

    /// Append every entry from `other`, keeping their order.
    pub fn extend(&mut self, other: Diagnostics) {
        debug!(count = other.entries.len(), "merging diagnostics");
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    /// Count entries at or above a severity.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|d| d.severity >= severity).count()
    }

    pub fn has_warnings(&self) -> bool {
        self.count_at_least(Severity::Warning) > 0
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
