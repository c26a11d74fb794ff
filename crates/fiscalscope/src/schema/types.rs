//! Core type definitions for column classification.

use serde::{Deserialize, Serialize};

/// Derived role of a column in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Native numeric column.
    Numeric,
    /// Low-cardinality grouping column (2 to 25 distinct values).
    Categorical,
    /// Dates or timestamps, native or parsed from text.
    Temporal,
    /// Every value distinct (keys, document numbers, tax IDs).
    Identifier,
    /// None of the above.
    Unknown,
}

impl ColumnRole {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ColumnRole::Numeric => "numeric",
            ColumnRole::Categorical => "categorical",
            ColumnRole::Temporal => "temporal",
            ColumnRole::Identifier => "identifier",
            ColumnRole::Unknown => "unknown",
        }
    }
}

impl Default for ColumnRole {
    fn default() -> Self {
        ColumnRole::Unknown
    }
}
