//! CSV/TSV and JSON loading with delimiter detection.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::dataset::Dataset;
use super::normalize::normalize_dataset;
use super::source::SourceMetadata;
use crate::error::{Result, ScopeError};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether the file has a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
    /// Normalize column labels and resolve fiscal aliases after loading.
    pub normalize: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
            normalize: true,
        }
    }
}

/// Loads tabular files into a [`Dataset`].
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Load a file and return the dataset and its metadata.
    ///
    /// `.json` files must hold an array of records; anything else is read as
    /// delimited text.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(Dataset, SourceMetadata)> {
        let path = path.as_ref();

        let contents = fs::read(path).map_err(|e| ScopeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let size_bytes = contents.len() as u64;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let (dataset, format) = match extension.as_str() {
            "json" => {
                let text = std::str::from_utf8(&contents).map_err(|e| {
                    ScopeError::UnsupportedFormat(format!("JSON file is not UTF-8: {}", e))
                })?;
                (self.finish(Dataset::from_json_records(text)?)?, "json".to_string())
            }
            "csv" | "tsv" | "txt" | "psv" => {
                let delimiter = match self.config.delimiter {
                    Some(d) => d,
                    None => detect_delimiter(&contents)?,
                };
                let dataset = self.finish(self.parse_bytes(&contents, delimiter)?)?;
                (dataset, delimiter_format(delimiter).to_string())
            }
            other => {
                return Err(ScopeError::UnsupportedFormat(format!(
                    "'.{}' files are not supported (use csv, tsv, txt or json)",
                    other
                )));
            }
        };

        info!(
            file = %path.display(),
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            format = %format,
            "loaded dataset"
        );

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            size_bytes,
            format,
            dataset.row_count(),
            dataset.column_count(),
        )
        .with_normalized(self.config.normalize);

        Ok((dataset, metadata))
    }

    /// Parse delimited text held in memory.
    pub fn parse_str(&self, text: &str) -> Result<Dataset> {
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(text.as_bytes())?,
        };
        let dataset = self.parse_bytes(text.as_bytes(), delimiter)?;
        self.finish(dataset)
    }

    fn finish(&self, dataset: Dataset) -> Result<Dataset> {
        if dataset.row_count() == 0 {
            return Err(ScopeError::EmptyData("No data rows found".to_string()));
        }
        if self.config.normalize {
            Ok(normalize_dataset(dataset))
        } else {
            Ok(dataset)
        }
    }

    /// Parse bytes directly.
    fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let mut records = reader.records();

        let headers: Vec<String> = if self.config.has_header {
            match records.next() {
                Some(record) => record?
                    .iter()
                    .map(|s| s.trim_start_matches('\u{feff}').to_string())
                    .collect(),
                None => return Err(ScopeError::EmptyData("No header row found".to_string())),
            }
        } else {
            Vec::new()
        };

        let mut rows: Vec<Vec<String>> = Vec::new();
        for (row_idx, result) in records.enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    debug!(max_rows = max, "row limit reached");
                    break;
                }
            }
            let record = result?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        let headers = if self.config.has_header {
            headers
        } else {
            let width = rows.first().map(|r| r.len()).unwrap_or(0);
            (0..width).map(|i| format!("column_{}", i + 1)).collect()
        };

        if headers.is_empty() {
            return Err(ScopeError::EmptyData("No columns found".to_string()));
        }

        let expected_cols = headers.len();
        for row in &mut rows {
            row.truncate(expected_cols);
        }

        Dataset::from_text_rows(headers, rows)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn delimiter_format(delimiter: u8) -> &'static str {
    match delimiter {
        b'\t' => "tsv",
        b',' => "csv",
        b';' => "csv-semicolon",
        b'|' => "psv",
        _ => "delimited",
    }
}

/// Pick the delimiter from the first non-empty lines.
///
/// A delimiter whose count is the same on every sampled line beats one that
/// varies; then more fields win; ties go to the earlier entry of
/// [`DELIMITERS`]. Defaults to a comma when nothing splits the header.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let lines: Vec<String> = BufReader::new(bytes)
        .lines()
        .map_while(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .take(10)
        .collect();
    if lines.is_empty() {
        return Err(ScopeError::EmptyData("No lines to analyze".to_string()));
    }

    let best = DELIMITERS
        .iter()
        .enumerate()
        .filter_map(|(position, &delimiter)| {
            let counts: Vec<usize> = lines.iter().map(|l| unquoted_count(l, delimiter)).collect();
            let header = counts[0];
            if header == 0 {
                return None;
            }
            let uniform = counts.iter().all(|&c| c == header);
            Some(((uniform, header, std::cmp::Reverse(position)), delimiter))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, delimiter)| delimiter)
        .unwrap_or(b',');

    debug!(delimiter = %(best as char).escape_default(), "detected delimiter");
    Ok(best)
}

/// Occurrences of `delimiter` outside double quotes.
fn unquoted_count(line: &str, delimiter: u8) -> usize {
    let delimiter = delimiter as char;
    line.chars()
        .fold((0, false), |(count, quoted), ch| match ch {
            '"' => (count, !quoted),
            c if c == delimiter && !quoted => (count + 1, quoted),
            _ => (count, quoted),
        })
        .0
}
