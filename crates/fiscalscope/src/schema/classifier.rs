//! Column role classification.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use super::types::ColumnRole;
use crate::input::{Cell, Dataset};

/// Minimum share of non-null values that must parse as dates.
pub const TEMPORAL_MIN_SUCCESS_RATE: f64 = 0.6;

/// Minimum number of rows that must parse as dates.
pub const TEMPORAL_MIN_PARSED_ROWS: usize = 10;

/// Cardinality range of a categorical column.
pub const CATEGORICAL_MIN_DISTINCT: usize = 2;
pub const CATEGORICAL_MAX_DISTINCT: usize = 25;

/// Role of every column plus the name lists callers usually need.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ColumnClassification {
    pub roles: IndexMap<String, ColumnRole>,
    pub numeric: Vec<String>,
    pub non_numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub temporal: Vec<String>,
    pub identifier: Vec<String>,
}

impl ColumnClassification {
    /// Role of a column, `Unknown` when absent.
    pub fn role(&self, column: &str) -> ColumnRole {
        self.roles.get(column).copied().unwrap_or_default()
    }
}

/// Splits dataset columns into numeric, categorical, temporal and
/// identifier-like groups.
#[derive(Debug, Clone, Default)]
pub struct ColumnClassifier;

impl ColumnClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Names of natively numeric columns, in dataset order.
    pub fn numeric_columns(&self, dataset: &Dataset) -> Vec<String> {
        dataset
            .column_names()
            .filter(|name| dataset.is_numeric_column(name))
            .map(str::to_string)
            .collect()
    }

    /// Complement of [`numeric_columns`](Self::numeric_columns).
    pub fn non_numeric_columns(&self, dataset: &Dataset) -> Vec<String> {
        dataset
            .column_names()
            .filter(|name| !dataset.is_numeric_column(name))
            .map(str::to_string)
            .collect()
    }

    /// Columns that hold dates, with their parsed values.
    ///
    /// Date-typed columns always qualify. Other columns qualify when more
    /// than 60% of their non-null values parse and at least 10 rows parse.
    /// Columns listed in `exclude` are never considered.
    pub fn temporal_columns(
        &self,
        dataset: &Dataset,
        exclude: &[String],
    ) -> IndexMap<String, Vec<Option<NaiveDateTime>>> {
        let mut temporal = IndexMap::new();

        for (name, cells) in dataset.columns() {
            if exclude.iter().any(|e| e == name) {
                continue;
            }
            if let Some(parsed) = parse_temporal(cells) {
                debug!(column = name, "temporal column detected");
                temporal.insert(name.to_string(), parsed);
            }
        }

        temporal
    }

    /// Classify every column. Roles are recomputed on each call.
    pub fn classify(&self, dataset: &Dataset) -> ColumnClassification {
        let numeric = self.numeric_columns(dataset);
        let non_numeric = self.non_numeric_columns(dataset);
        let temporal_map = self.temporal_columns(dataset, &numeric);

        let mut classification = ColumnClassification {
            numeric: numeric.clone(),
            non_numeric,
            temporal: temporal_map.keys().cloned().collect(),
            ..ColumnClassification::default()
        };

        for (name, cells) in dataset.columns() {
            let role = if numeric.iter().any(|n| n == name) {
                ColumnRole::Numeric
            } else if temporal_map.contains_key(name) {
                ColumnRole::Temporal
            } else {
                let (distinct, non_null) = cardinality(cells);
                if (CATEGORICAL_MIN_DISTINCT..=CATEGORICAL_MAX_DISTINCT).contains(&distinct) {
                    ColumnRole::Categorical
                } else if distinct > CATEGORICAL_MAX_DISTINCT && distinct == non_null {
                    ColumnRole::Identifier
                } else {
                    ColumnRole::Unknown
                }
            };

            match role {
                ColumnRole::Categorical => classification.categorical.push(name.to_string()),
                ColumnRole::Identifier => classification.identifier.push(name.to_string()),
                _ => {}
            }
            classification.roles.insert(name.to_string(), role);
        }

        classification
    }
}

/// Parse a column as dates when it qualifies as temporal.
fn parse_temporal(cells: &[Cell]) -> Option<Vec<Option<NaiveDateTime>>> {
    let native = cells
        .iter()
        .any(|c| matches!(c, Cell::Date(_)))
        && cells.iter().all(|c| c.is_null() || matches!(c, Cell::Date(_)));

    let parsed: Vec<Option<NaiveDateTime>> = cells.iter().map(Cell::as_datetime).collect();
    if native {
        return Some(parsed);
    }

    let non_null = cells.iter().filter(|c| !c.is_null()).count();
    let ok = parsed.iter().filter(|p| p.is_some()).count();
    if non_null == 0 || ok < TEMPORAL_MIN_PARSED_ROWS {
        return None;
    }

    let rate = ok as f64 / non_null as f64;
    (rate > TEMPORAL_MIN_SUCCESS_RATE).then_some(parsed)
}

/// Distinct and total counts of non-null values.
pub(crate) fn cardinality(cells: &[Cell]) -> (usize, usize) {
    let mut seen = HashSet::new();
    let mut non_null = 0;
    for cell in cells.iter().filter(|c| !c.is_null()) {
        non_null += 1;
        seen.insert(cell.key());
    }
    (seen.len(), non_null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let rows = 30;
        Dataset::from_columns(vec![
            ("valor", (0..rows).map(|i| Cell::Number(i as f64)).collect::<Vec<_>>()),
            ("uf", (0..rows).map(|i| Cell::text(["SP", "RJ", "MG"][i % 3])).collect()),
            ("chave", (0..rows).map(|i| Cell::text(format!("K{:03}", i))).collect()),
            (
                "emissao",
                (0..rows)
                    .map(|i| Cell::text(format!("{:02}/01/2024", i % 28 + 1)))
                    .collect(),
            ),
            ("obs", (0..rows).map(|_| Cell::text("x")).collect()),
        ])
        .unwrap()
    }

    #[test]
    fn test_numeric_split() {
        let classifier = ColumnClassifier::new();
        let ds = dataset();
        assert_eq!(classifier.numeric_columns(&ds), vec!["valor"]);
        assert_eq!(
            classifier.non_numeric_columns(&ds),
            vec!["uf", "chave", "emissao", "obs"]
        );
    }

    #[test]
    fn test_classify_roles() {
        let classification = ColumnClassifier::new().classify(&dataset());
        assert_eq!(classification.role("valor"), ColumnRole::Numeric);
        assert_eq!(classification.role("uf"), ColumnRole::Categorical);
        assert_eq!(classification.role("chave"), ColumnRole::Identifier);
        assert_eq!(classification.role("emissao"), ColumnRole::Temporal);
        assert_eq!(classification.role("obs"), ColumnRole::Unknown);
        assert_eq!(classification.role("missing"), ColumnRole::Unknown);
        assert_eq!(classification.temporal, vec!["emissao"]);
    }

    #[test]
    fn test_temporal_needs_ten_parsed_rows() {
        let ds = Dataset::from_columns(vec![(
            "data",
            (1..=9)
                .map(|d| Cell::text(format!("2024-01-{:02}", d)))
                .collect::<Vec<_>>(),
        )])
        .unwrap();
        assert!(ColumnClassifier::new().temporal_columns(&ds, &[]).is_empty());
    }

    #[test]
    fn test_temporal_success_rate_threshold() {
        // 12 dates, 8 junk values: 60% exactly is not enough.
        let mut cells: Vec<Cell> = (1..=12)
            .map(|d| Cell::text(format!("2024-02-{:02}", d)))
            .collect();
        cells.extend((0..8).map(|_| Cell::text("sem data")));
        let ds = Dataset::from_columns(vec![("data", cells)]).unwrap();
        assert!(ColumnClassifier::new().temporal_columns(&ds, &[]).is_empty());
    }

    #[test]
    fn test_temporal_respects_exclude() {
        let ds = dataset();
        let temporal = ColumnClassifier::new().temporal_columns(&ds, &["emissao".to_string()]);
        assert!(temporal.is_empty());
    }
}
