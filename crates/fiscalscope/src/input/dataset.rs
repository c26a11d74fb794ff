//! In-memory tabular dataset.

use indexmap::IndexMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Result, ScopeError};

use super::cell::{parse_finite, Cell};

/// Default number of rows hashed by [`Dataset::signature`].
pub const SIGNATURE_SAMPLE_ROWS: usize = 50;

/// Digit-only values longer than this are identifiers, not numbers.
const MAX_NUMERIC_DIGITS: usize = 15;

/// An ordered collection of named, equally long columns.
///
/// Column names are unique; when building from raw input a repeated name is
/// dropped and the first occurrence kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    columns: IndexMap<String, Vec<Cell>>,
    row_count: usize,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from named columns.
    ///
    /// Fails when the columns do not all have the same length.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<Cell>)>,
        S: Into<String>,
    {
        let mut map: IndexMap<String, Vec<Cell>> = IndexMap::new();
        let mut row_count: Option<usize> = None;

        for (name, cells) in columns {
            let name = name.into();
            let expected = *row_count.get_or_insert(cells.len());
            if cells.len() != expected {
                return Err(ScopeError::RaggedColumn {
                    column: name,
                    expected,
                    actual: cells.len(),
                });
            }
            if map.contains_key(&name) {
                debug!(column = %name, "dropping duplicate column");
                continue;
            }
            map.insert(name, cells);
        }

        Ok(Self {
            columns: map,
            row_count: row_count.unwrap_or(0),
        })
    }

    /// Build a dataset from raw text rows, inferring one native type per column.
    ///
    /// Null tokens become [`Cell::Null`]. A column whose non-null values all
    /// parse as numbers becomes numeric unless it holds code-like values
    /// (leading zeros, very long digit strings), which stay text.
    pub fn from_text_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let width = headers.len();
        let mut raw: Vec<Vec<String>> = vec![Vec::with_capacity(rows.len()); width];
        for mut row in rows {
            row.resize(width, String::new());
            for (idx, value) in row.into_iter().enumerate() {
                raw[idx].push(value);
            }
        }

        Self::from_columns(
            headers
                .into_iter()
                .zip(raw)
                .map(|(name, values)| (name, infer_cells(values))),
        )
    }

    /// Build a dataset from a JSON array of flat objects.
    ///
    /// Columns appear in first-seen key order; absent keys are null.
    pub fn from_json_records(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let records = value.as_array().ok_or_else(|| {
            ScopeError::UnsupportedFormat("expected a JSON array of records".to_string())
        })?;

        let mut names: IndexMap<String, ()> = IndexMap::new();
        for record in records {
            let object = record.as_object().ok_or_else(|| {
                ScopeError::UnsupportedFormat("every JSON record must be an object".to_string())
            })?;
            for key in object.keys() {
                names.entry(key.clone()).or_insert(());
            }
        }

        Self::from_columns(names.into_keys().map(|name| {
            let cells = records
                .iter()
                .map(|record| record.get(&name).map(Cell::from).unwrap_or(Cell::Null))
                .collect();
            (name, cells)
        }))
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when the dataset has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0 || self.columns.is_empty()
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    /// Iterate over `(name, cells)` pairs in order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Cell])> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Cells of a column by name.
    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    /// A single cell.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        self.columns.get(column).and_then(|cells| cells.get(row))
    }

    /// Column coerced to numbers; unparseable cells become `None`.
    pub fn numeric_values(&self, name: &str) -> Option<Vec<Option<f64>>> {
        self.column(name)
            .map(|cells| cells.iter().map(Cell::as_f64).collect())
    }

    /// True when every non-null cell of the column is a native number.
    ///
    /// An all-null column counts as numeric, like a float column read from CSV.
    pub fn is_numeric_column(&self, name: &str) -> bool {
        self.column(name)
            .map(|cells| {
                cells
                    .iter()
                    .all(|c| c.is_null() || c.is_number())
            })
            .unwrap_or(false)
    }

    /// Return a copy with the column replaced (or appended when new).
    pub fn with_column(mut self, name: impl Into<String>, cells: Vec<Cell>) -> Result<Self> {
        let name = name.into();
        if !self.columns.is_empty() && cells.len() != self.row_count {
            return Err(ScopeError::RaggedColumn {
                column: name,
                expected: self.row_count,
                actual: cells.len(),
            });
        }
        if self.columns.is_empty() {
            self.row_count = cells.len();
        }
        self.columns.insert(name, cells);
        Ok(self)
    }

    /// Return a copy with columns renamed by `rename`; colliding names keep
    /// the first occurrence.
    pub fn rename_columns<F>(self, mut rename: F) -> Self
    where
        F: FnMut(&str) -> String,
    {
        let row_count = self.row_count;
        let mut map: IndexMap<String, Vec<Cell>> = IndexMap::with_capacity(self.columns.len());
        for (name, cells) in self.columns {
            let renamed = rename(&name);
            if map.contains_key(&renamed) {
                debug!(column = %name, renamed = %renamed, "dropping column that collides after rename");
                continue;
            }
            map.insert(renamed, cells);
        }
        Self {
            columns: map,
            row_count,
        }
    }

    /// SHA-256 over the column names and the first `sample_rows` rows.
    ///
    /// Cheap content fingerprint, usable as a cache key.
    pub fn signature(&self, sample_rows: usize) -> String {
        let take = sample_rows.min(self.row_count);
        let rows: Vec<Vec<&Cell>> = (0..take)
            .map(|r| self.columns.values().map(|cells| &cells[r]).collect())
            .collect();
        let payload = serde_json::json!({
            "columns": self.columns.keys().collect::<Vec<_>>(),
            "rows": rows,
        });

        let mut hasher = Sha256::new();
        hasher.update(payload.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Check if a raw value represents a missing/null value.
    pub fn is_null_token(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("nil")
            || trimmed == "."
            || trimmed == "-"
    }
}

/// Infer cells for one raw column.
fn infer_cells(values: Vec<String>) -> Vec<Cell> {
    let numeric = values
        .iter()
        .filter(|v| !Dataset::is_null_token(v))
        .all(|v| !is_code_like(v.trim()) && parse_finite(v).is_some());

    values
        .into_iter()
        .map(|value| {
            if Dataset::is_null_token(&value) {
                Cell::Null
            } else if numeric {
                parse_finite(&value).map(Cell::Number).unwrap_or(Cell::Null)
            } else {
                Cell::Text(value)
            }
        })
        .collect()
}

/// Digit strings with a leading zero or too many digits to survive a float.
pub(crate) fn is_code_like(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    (digits.len() > 1 && digits.starts_with('0')) || digits.len() > MAX_NUMERIC_DIGITS
}
