//! Dataset overview: shape, descriptions, missingness and correlations.

use indexmap::IndexMap;
use serde::Serialize;

use super::stats::{pairwise_complete, pearson};
use crate::input::Dataset;
use crate::schema::ColumnDescription;

/// Share of null values in one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingShare {
    pub column: String,
    pub fraction: f64,
}

/// Pearson correlations between numeric columns; `None` where undefined.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverviewReport {
    pub n_rows: usize,
    pub n_cols: usize,
    pub numeric_columns: Vec<String>,
    pub non_numeric_columns: Vec<String>,
    pub describe: IndexMap<String, ColumnDescription>,
    /// Sorted by fraction, highest first.
    pub missing: Vec<MissingShare>,
    pub correlation: CorrelationMatrix,
}

pub fn overview(dataset: &Dataset, numeric: &[String], non_numeric: &[String]) -> OverviewReport {
    let describe = dataset
        .columns()
        .map(|(name, cells)| {
            let is_numeric = numeric.iter().any(|n| n == name);
            (name.to_string(), ColumnDescription::describe(cells, is_numeric))
        })
        .collect();

    let rows = dataset.row_count();
    let mut missing: Vec<MissingShare> = dataset
        .columns()
        .map(|(name, cells)| MissingShare {
            column: name.to_string(),
            fraction: if rows == 0 {
                0.0
            } else {
                cells.iter().filter(|c| c.is_null()).count() as f64 / rows as f64
            },
        })
        .collect();
    missing.sort_by(|a, b| b.fraction.total_cmp(&a.fraction));

    OverviewReport {
        n_rows: rows,
        n_cols: dataset.column_count(),
        numeric_columns: numeric.to_vec(),
        non_numeric_columns: non_numeric.to_vec(),
        describe,
        missing,
        correlation: correlation_matrix(dataset, numeric),
    }
}

fn correlation_matrix(dataset: &Dataset, numeric: &[String]) -> CorrelationMatrix {
    let columns: Vec<(String, Vec<Option<f64>>)> = numeric
        .iter()
        .filter_map(|name| dataset.numeric_values(name).map(|v| (name.clone(), v)))
        .collect();

    let values = columns
        .iter()
        .map(|(_, x)| {
            columns
                .iter()
                .map(|(_, y)| {
                    let (x, y) = pairwise_complete(x, y);
                    pearson(&x, &y)
                })
                .collect()
        })
        .collect();

    CorrelationMatrix {
        columns: columns.into_iter().map(|(name, _)| name).collect(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Cell;

    #[test]
    fn test_overview() {
        let ds = Dataset::from_columns(vec![
            ("a", vec![Cell::Number(1.0), Cell::Number(2.0), Cell::Number(3.0), Cell::Null]),
            ("b", vec![Cell::Number(2.0), Cell::Number(4.0), Cell::Number(6.0), Cell::Number(8.0)]),
            ("uf", vec![Cell::text("SP"), Cell::Null, Cell::Null, Cell::text("SP")]),
        ])
        .unwrap();

        let report = overview(&ds, &["a".to_string(), "b".to_string()], &["uf".to_string()]);
        assert_eq!(report.n_rows, 4);
        assert_eq!(report.n_cols, 3);
        assert_eq!(report.missing[0].column, "uf");
        assert_eq!(report.missing[0].fraction, 0.5);
        assert_eq!(report.missing[2].fraction, 0.0);

        let a = &report.describe["a"];
        assert_eq!(a.count, 3);
        assert_eq!(a.numeric.as_ref().unwrap().median, 2.0);
        assert!(report.describe["uf"].numeric.is_none());

        let r = report.correlation.get("a", "b").unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }
}
