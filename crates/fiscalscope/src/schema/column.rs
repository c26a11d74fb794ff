//! Per-column descriptive statistics.

use indexmap::IndexMap;
use serde::Serialize;

use crate::analysis::stats::{quantile_sorted, sorted, RunningStats};
use crate::input::{Cell, CellKey};

/// Statistics for numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with a single value.
    pub std: Option<f64>,
    pub min: f64,
    /// First quartile (25th percentile).
    pub q1: f64,
    pub median: f64,
    /// Third quartile (75th percentile).
    pub q3: f64,
    pub max: f64,
}

impl NumericSummary {
    /// Summarize the finite values; `None` when there are none.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let finite: Vec<f64> = sorted(values).into_iter().filter(|v| v.is_finite()).collect();
        let stats: RunningStats = finite.iter().copied().collect();

        Some(Self {
            count: stats.count(),
            mean: stats.mean()?,
            std: stats.sample_std(),
            min: stats.min()?,
            q1: quantile_sorted(&finite, 0.25)?,
            median: quantile_sorted(&finite, 0.5)?,
            q3: quantile_sorted(&finite, 0.75)?,
            max: stats.max()?,
        })
    }

    /// Calculate the interquartile range.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Lower and upper IQR fences.
    pub fn iqr_bounds(&self, multiplier: f64) -> (f64, f64) {
        let iqr = self.iqr();
        (self.q1 - multiplier * iqr, self.q3 + multiplier * iqr)
    }

    /// Check if a value is an outlier using the IQR method.
    pub fn is_outlier_iqr(&self, value: f64, multiplier: f64) -> bool {
        let (lower, upper) = self.iqr_bounds(multiplier);
        value < lower || value > upper
    }
}

/// A value with its number of occurrences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: Cell,
    pub count: usize,
}

/// Description of one column, as shown in the overview.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnDescription {
    /// Number of non-null values.
    pub count: usize,
    /// Number of distinct non-null values.
    pub unique: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_frequent: Option<ValueCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub least_frequent: Option<ValueCount>,
}

impl ColumnDescription {
    /// Describe a column. `numeric` selects whether numeric statistics apply.
    pub fn describe(cells: &[Cell], numeric: bool) -> Self {
        let counts = value_counts(cells, false);
        let count = counts.iter().map(|(_, n)| n).sum();

        let numeric = if numeric {
            let values: Vec<f64> = cells.iter().filter_map(Cell::as_f64).collect();
            NumericSummary::from_values(&values)
        } else {
            None
        };

        Self {
            count,
            unique: counts.len(),
            numeric,
            most_frequent: counts.first().map(|(key, n)| ValueCount {
                value: key.to_cell(),
                count: *n,
            }),
            least_frequent: counts.last().map(|(key, n)| ValueCount {
                value: key.to_cell(),
                count: *n,
            }),
        }
    }
}

/// Count occurrences of each value, most frequent first.
///
/// Ties keep first-seen order. Nulls are counted as a value only when
/// `include_null` is set.
pub fn value_counts(cells: &[Cell], include_null: bool) -> Vec<(CellKey, usize)> {
    let mut counts: IndexMap<CellKey, usize> = IndexMap::new();
    for cell in cells {
        let key = cell.key();
        if key.is_null() && !include_null {
            continue;
        }
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut counts: Vec<(CellKey, usize)> = counts.into_iter().collect();
    // Stable sort keeps first-seen order among ties.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_summary() {
        let summary = NumericSummary::from_values(&[4.0, 1.0, 3.0, 2.0, f64::NAN]).unwrap();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 4.0);
        assert_eq!(summary.q1, 1.75);
        assert_eq!(summary.median, 2.5);
        assert_eq!(summary.q3, 3.25);
        assert_eq!(summary.iqr(), 1.5);
        assert!(summary.is_outlier_iqr(6.0, 1.5));
        assert!(!summary.is_outlier_iqr(5.5, 1.5));
    }

    #[test]
    fn test_numeric_summary_empty() {
        assert!(NumericSummary::from_values(&[]).is_none());
        let single = NumericSummary::from_values(&[7.0]).unwrap();
        assert_eq!(single.std, None);
    }

    #[test]
    fn test_value_counts_ties_keep_first_seen() {
        let cells = vec![
            Cell::text("b"),
            Cell::text("a"),
            Cell::Null,
            Cell::text("a"),
            Cell::text("c"),
            Cell::Null,
        ];
        let counts = value_counts(&cells, true);
        assert_eq!(counts[0], (CellKey::Text("a".into()), 2));
        assert_eq!(counts[1], (CellKey::Null, 2));
        assert_eq!(counts[2], (CellKey::Text("b".into()), 1));
        assert_eq!(counts[3], (CellKey::Text("c".into()), 1));

        let without_null = value_counts(&cells, false);
        assert_eq!(without_null.len(), 3);
    }

    #[test]
    fn test_describe_text_column() {
        let cells = vec![Cell::text("SP"), Cell::text("RJ"), Cell::text("SP"), Cell::Null];
        let description = ColumnDescription::describe(&cells, false);
        assert_eq!(description.count, 3);
        assert_eq!(description.unique, 2);
        assert!(description.numeric.is_none());
        assert_eq!(description.most_frequent.unwrap().value, Cell::text("SP"));
        assert_eq!(description.least_frequent.unwrap().value, Cell::text("RJ"));
    }
}
