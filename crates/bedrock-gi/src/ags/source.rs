//! Metadata about an ingested AGS source.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::detect::AgsVersion;

/// Metadata about the source text of one ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path, when read from a file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Full path to the file, when read from a file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// SHA-256 hash of the text.
    pub hash: String,
    /// Text size in bytes.
    pub size_bytes: u64,
    /// Detected AGS edition.
    pub version: AgsVersion,
    /// Number of physical lines.
    pub line_count: usize,
    /// Number of decoded groups.
    pub group_count: usize,
    /// When the source was ingested.
    pub ingested_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Describe in-memory text.
    pub fn from_text(text: &str, version: AgsVersion, group_count: usize) -> Self {
        Self {
            file: None,
            path: None,
            hash: content_hash(text),
            size_bytes: text.len() as u64,
            version,
            line_count: text.lines().count(),
            group_count,
            ingested_at: Utc::now(),
        }
    }

    /// Attach the path the text was read from.
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned());
        self.path = Some(path.to_path_buf());
        self
    }
}

/// Hex SHA-256 of the text, prefixed with the algorithm.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_from_text() {
        let text = "\"**PROJ\"\n\"*PROJ_ID\"\n\"P1\"\n";
        let meta = SourceMetadata::from_text(text, AgsVersion::Ags3, 1).with_path("/data/site.ags");

        assert_eq!(meta.line_count, 3);
        assert_eq!(meta.size_bytes, text.len() as u64);
        assert_eq!(meta.file.as_deref(), Some("site.ags"));
        assert!(meta.hash.starts_with("sha256:"));
        assert_eq!(meta.hash.len(), "sha256:".len() + 64);
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(content_hash("abc"), content_hash("abc"));
        assert_ne!(content_hash("abc"), content_hash("abd"));
    }
}
