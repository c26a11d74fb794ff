//! Error types for the fiscalscope library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fiscalscope operations.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File format not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// No dataset loaded, or the dataset has no rows.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Mandatory columns are absent. No partial results are produced.
    #[error("Missing mandatory columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A column does not have the same number of cells as the others.
    #[error("Column '{column}' has {actual} values, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScopeError {
    /// Whether this error is a precondition failure on the input table.
    pub fn is_precondition(&self) -> bool {
        matches!(self, ScopeError::MissingColumns(_) | ScopeError::EmptyData(_))
    }
}

/// Result type alias for fiscalscope operations.
pub type Result<T> = std::result::Result<T, ScopeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message() {
        let err = ScopeError::MissingColumns(vec!["cfop".into(), "ncm".into()]);
        assert_eq!(err.to_string(), "Missing mandatory columns: cfop, ncm");
        assert!(err.is_precondition());
    }

    #[test]
    fn test_io_is_not_precondition() {
        let err = ScopeError::Config("bad".into());
        assert!(!err.is_precondition());
    }
}
