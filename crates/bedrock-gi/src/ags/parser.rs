//! AGS 3 parser.
//!
//! AGS 3 is a line-oriented format of quoted, comma-separated fields:
//!
//! ```text
//! "**HOLE"
//! "*HOLE_ID","*HOLE_TYPE","*HOLE_NATE"
//! "<UNITS>","","m"
//! "BH1","CP","523145.12"
//! "<CONT>","","7"
//! ```
//!
//! Group lines open a table, header lines name its columns (possibly over
//! several physical lines), the units line is ignored and everything else is
//! data. A `<CONT>` line extends the previous row where a line-length limit
//! forced a value onto the next line.

use tracing::{debug, info};

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity, Stage};
use crate::error::{GiError, Result};
use crate::table::{GroupMap, GroupTable, Value};

/// Separator between quoted fields.
const FIELD_SEPARATOR: &str = "\",\"";
const GROUP_MARKER: &str = "\"**";
const HEADER_MARKER: &str = "\"*";
const UNITS_MARKER: &str = "\"<UNITS>\"";
/// First raw field of a continuation line.
const CONT_FIELD: &str = "\"<CONT>";
const CONT_VALUE: &str = "<CONT>";

/// Decodes AGS text into grouped tables.
///
/// The AGS 3 parser implements this; an AGS 4 decoder can be supplied by the
/// caller as long as it produces the same [`GroupMap`] representation.
pub trait GroupDecoder: Send + Sync {
    /// Decode `text`, recording recoverable problems in `diagnostics`.
    fn decode(&self, text: &str, diagnostics: &mut Diagnostics) -> Result<GroupMap>;
}

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Drop columns in which every value is null.
    pub drop_null_columns: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            drop_null_columns: true,
        }
    }
}

/// Parses AGS 3 text into a [`GroupMap`].
#[derive(Debug, Clone, Default)]
pub struct Ags3Parser {
    config: ParserConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Start,
    GroupName,
    Headers,
    Units,
    DataRow,
}

/// Buffers for the group currently being read.
struct OpenGroup {
    name: String,
    /// Line of the group-start line.
    line: usize,
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl OpenGroup {
    fn new(name: String, line: usize) -> Self {
        Self {
            name,
            line,
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Merge a `<CONT>` line into the last row. Returns false if there is none.
    fn continue_last_row(&mut self, fields: &[&str]) -> bool {
        let Some(last) = self.rows.last_mut() else {
            return false;
        };

        for (cell, field) in last.iter_mut().zip(fields) {
            let data = trim_field(field);
            if data.is_empty() || data == CONT_VALUE {
                continue;
            }
            *cell = if cell.is_null() {
                Value::coerce(data)
            } else {
                Value::String(format!("{}{}", cell, data))
            };
        }
        true
    }
}

impl Ags3Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse AGS 3 text.
    ///
    /// Rows whose field count disagrees with the header count are skipped
    /// and reported. Fails if the text has no group-start line.
    pub fn parse(&self, text: &str, diagnostics: &mut Diagnostics) -> Result<GroupMap> {
        let mut groups = GroupMap::new();
        let mut current: Option<OpenGroup> = None;
        let mut line_kind = LineKind::Start;
        let mut line_count = 0;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            let last_kind = line_kind;
            line_count = line_no;

            if line.starts_with(GROUP_MARKER) {
                line_kind = LineKind::GroupName;
                if let Some(group) = current.take() {
                    close_group(group, &mut groups, diagnostics);
                }
                let name = line.trim_matches(|c| matches!(c, ' ' | ',' | '"' | '*'));
                debug!(group = name, line = line_no, "opening group");
                current = Some(OpenGroup::new(name.to_string(), line_no));
            } else if line.starts_with(HEADER_MARKER) {
                line_kind = LineKind::Headers;
                let headers = line.split(FIELD_SEPARATOR).map(trim_header);
                match current.as_mut() {
                    Some(group) if last_kind == LineKind::Headers => {
                        group.headers.extend(headers)
                    }
                    Some(group) => group.headers = headers.collect(),
                    None => diagnostics.push(
                        Diagnostic::new(
                            Stage::Parse,
                            Severity::Warning,
                            DiagnosticKind::DataOutsideGroup,
                            "header line before any group-start line ignored",
                        )
                        .at_line(line_no),
                    ),
                }
            } else if line.starts_with(UNITS_MARKER) {
                line_kind = LineKind::Units;
            } else {
                line_kind = LineKind::DataRow;
                let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
                if fields.iter().all(|f| f.is_empty()) {
                    continue;
                }

                let Some(group) = current.as_mut() else {
                    diagnostics.push(
                        Diagnostic::new(
                            Stage::Parse,
                            Severity::Warning,
                            DiagnosticKind::DataOutsideGroup,
                            "data line before any group-start line ignored",
                        )
                        .at_line(line_no),
                    );
                    continue;
                };

                if fields.len() != group.headers.len() {
                    diagnostics.push(
                        Diagnostic::new(
                            Stage::Parse,
                            Severity::Warning,
                            DiagnosticKind::RowSkipped,
                            format!(
                                "the number of columns on line {} ({}) doesn't match the number of columns of group {} ({}); headers: [{}]; line: [{}]",
                                line_no,
                                fields.len(),
                                group.name,
                                group.headers.len(),
                                group.headers.join(", "),
                                fields.iter().map(|f| trim_field(f)).collect::<Vec<_>>().join(", "),
                            ),
                        )
                        .at_line(line_no)
                        .in_group(group.name.clone()),
                    );
                    continue;
                }

                if fields[0] == CONT_FIELD {
                    if !group.continue_last_row(&fields) {
                        diagnostics.push(
                            Diagnostic::new(
                                Stage::Parse,
                                Severity::Warning,
                                DiagnosticKind::OrphanContinuation,
                                "continuation line without a preceding data row ignored",
                            )
                            .at_line(line_no)
                            .in_group(group.name.clone()),
                        );
                    }
                } else {
                    group
                        .rows
                        .push(fields.iter().map(|f| Value::coerce(trim_field(f))).collect());
                }
            }
        }

        match current {
            Some(group) => close_group(group, &mut groups, diagnostics),
            None => {
                return Err(GiError::format(
                    line_count,
                    "the data does not contain any groups, i.e. lines starting with \"**",
                ));
            }
        }

        if self.config.drop_null_columns {
            groups = groups
                .into_iter()
                .map(|(name, table)| (name, table.without_null_columns()))
                .collect();
        }

        info!(groups = groups.len(), lines = line_count, "parsed AGS 3 data");
        Ok(groups)
    }
}

/// Store a finished group. A repeated group name appends its rows when the
/// headers match the first block and is ignored otherwise.
fn close_group(group: OpenGroup, groups: &mut GroupMap, diagnostics: &mut Diagnostics) {
    debug!(
        group = %group.name,
        rows = group.rows.len(),
        columns = group.headers.len(),
        "closing group"
    );

    let Some(existing) = groups.get_mut(&group.name) else {
        let table = GroupTable::new(group.name, group.headers, group.rows);
        groups.insert(table.name.clone(), table);
        return;
    };

    let message = if existing.headers == group.headers {
        let appended = group.rows.len();
        existing.rows.extend(group.rows);
        format!(
            "group {} repeated on line {}; {} rows appended to the first block",
            group.name, group.line, appended
        )
    } else {
        format!(
            "group {} repeated on line {} with different headers; its {} rows were ignored",
            group.name,
            group.line,
            group.rows.len()
        )
    };
    diagnostics.push(
        Diagnostic::new(
            Stage::Parse,
            Severity::Warning,
            DiagnosticKind::RepeatedGroup,
            message,
        )
        .at_line(group.line)
        .in_group(group.name),
    );
}

impl GroupDecoder for Ags3Parser {
    fn decode(&self, text: &str, diagnostics: &mut Diagnostics) -> Result<GroupMap> {
        self.parse(text, diagnostics)
    }
}

fn trim_header(field: &str) -> String {
    field
        .trim_matches(|c| matches!(c, ' ' | ',' | '"' | '*'))
        .to_string()
}

fn trim_field(field: &str) -> &str {
    field.trim_matches(|c| matches!(c, ' ' | '"'))
}
