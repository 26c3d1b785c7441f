//! AGS edition detection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GiError, Result};

/// AGS format edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgsVersion {
    Ags3,
    Ags4,
}

impl fmt::Display for AgsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgsVersion::Ags3 => f.write_str("AGS 3"),
            AgsVersion::Ags4 => f.write_str("AGS 4"),
        }
    }
}

/// Detect the AGS edition from the first non-blank line.
///
/// AGS 3 opens with a `"**GROUP` line, AGS 4 with a `"GROUP"` descriptor
/// row. Anything else, including text made only of blank lines, is a
/// format error.
pub fn detect_ags_version(text: &str) -> Result<AgsVersion> {
    let first = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .find(|(_, line)| !line.is_empty());

    match first {
        Some((_, line)) if line.starts_with("\"**") => Ok(AgsVersion::Ags3),
        Some((_, line)) if line.starts_with("\"GROUP\"") => Ok(AgsVersion::Ags4),
        Some((line_no, _)) => Err(GiError::format(
            line_no,
            "the data provided is not valid AGS 3 or AGS 4 data",
        )),
        None => Err(GiError::format(0, "the data provided has only blank lines")),
    }
}
