//! Metadata about a loaded data source.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about the source data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, json, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns after loading.
    pub column_count: usize,
    /// Whether labels were resolved into the canonical fiscal schema.
    pub normalized: bool,
    /// When the file was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been loaded.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: impl Into<String>,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format: format.into(),
            row_count,
            column_count,
            normalized: false,
            loaded_at: Utc::now(),
        }
    }

    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    /// First 12 hex digits of the content hash, for display.
    pub fn short_hash(&self) -> &str {
        let hex = self.hash.strip_prefix("sha256:").unwrap_or(&self.hash);
        hex.get(..12).unwrap_or(hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_extracted() {
        let meta = SourceMetadata::new(
            PathBuf::from("/tmp/notas/itens.csv"),
            "sha256:00".to_string(),
            10,
            "csv",
            2,
            3,
        );
        assert_eq!(meta.file, "itens.csv");
        assert_eq!(meta.format, "csv");
        assert!(!meta.normalized);
        assert_eq!(meta.short_hash(), "00");
    }

    #[test]
    fn test_short_hash_truncates() {
        let meta = SourceMetadata::new(
            PathBuf::from("itens.json"),
            "sha256:0123456789abcdef0123".to_string(),
            10,
            "json",
            1,
            1,
        )
        .with_normalized(true);
        assert_eq!(meta.short_hash(), "0123456789ab");
        assert!(meta.normalized);
    }
}
