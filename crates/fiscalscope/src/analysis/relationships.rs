//! Numeric correlations and categorical drivers.

use indexmap::IndexMap;
use serde::Serialize;

use super::stats::{pairwise_complete, round_to, spearman, RunningStats};
use crate::input::{CellKey, Dataset};
use crate::schema::{cardinality, CATEGORICAL_MAX_DISTINCT, CATEGORICAL_MIN_DISTINCT};

/// Minimum |rho| for a reported numeric pair.
pub const MIN_CORRELATION: f64 = 0.2;

/// Number of pairs and drivers reported.
pub const TOP_RELATIONSHIPS: usize = 5;

/// A pair of numeric columns and their absolute Spearman correlation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPair {
    /// `"A ~ B"`.
    pub variables: String,
    /// |rho|, 3 decimals.
    pub correlation: f64,
}

/// Spread of a numeric column's means across the categories of another.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalDriver {
    pub driver: String,
    pub target: String,
    /// max - min of per-category means, 4 decimals.
    pub mean_spread: f64,
    pub categories: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelationshipSummary {
    pub correlations: Vec<CorrelationPair>,
    pub categorical: Vec<CategoricalDriver>,
}

/// Rank numeric pairs by |Spearman rho| and categorical columns by how much
/// they move the numeric means.
pub fn summarize_relationships(
    dataset: &Dataset,
    numeric_columns: &[String],
    categorical_columns: &[String],
) -> RelationshipSummary {
    let numeric: Vec<(&String, Vec<Option<f64>>)> = numeric_columns
        .iter()
        .filter_map(|name| dataset.numeric_values(name).map(|values| (name, values)))
        .collect();

    let mut pairs = Vec::new();
    for (i, (a, x)) in numeric.iter().enumerate() {
        for (b, y) in &numeric[i + 1..] {
            let (x, y) = pairwise_complete(x, y);
            if let Some(rho) = spearman(&x, &y) {
                pairs.push((a.as_str(), b.as_str(), rho.abs()));
            }
        }
    }

    let mut drivers = Vec::new();
    for driver in categorical_columns {
        let Some(cells) = dataset.column(driver) else {
            continue;
        };
        let (distinct, _) = cardinality(cells);
        if !(CATEGORICAL_MIN_DISTINCT..=CATEGORICAL_MAX_DISTINCT).contains(&distinct) {
            continue;
        }

        for (target, values) in &numeric {
            let mut groups: IndexMap<CellKey, RunningStats> = IndexMap::new();
            for (cell, value) in cells.iter().zip(values) {
                if let Some(value) = value {
                    if !cell.is_null() {
                        groups.entry(cell.key()).or_default().add(*value);
                    }
                }
            }
            if groups.len() < 2 {
                continue;
            }

            let means: Vec<f64> = groups.values().filter_map(RunningStats::mean).collect();
            let max = means.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min = means.iter().copied().fold(f64::INFINITY, f64::min);
            let spread = max - min;
            if !(spread > 0.0) {
                continue;
            }

            drivers.push(CategoricalDriver {
                driver: driver.clone(),
                target: (*target).clone(),
                mean_spread: round_to(spread, 4),
                categories: distinct.min(CATEGORICAL_MAX_DISTINCT),
            });
        }
    }

    drivers.sort_by(|a, b| b.mean_spread.total_cmp(&a.mean_spread));
    drivers.truncate(TOP_RELATIONSHIPS);

    RelationshipSummary {
        correlations: select_correlations(pairs),
        categorical: drivers,
    }
}

/// Sort pairs by |rho| descending, keep the top 5 at or above the threshold.
pub fn select_correlations(mut pairs: Vec<(&str, &str, f64)>) -> Vec<CorrelationPair> {
    pairs.sort_by(|a, b| b.2.total_cmp(&a.2));
    pairs
        .into_iter()
        .take(TOP_RELATIONSHIPS)
        .filter(|(_, _, score)| *score >= MIN_CORRELATION)
        .map(|(a, b, score)| CorrelationPair {
            variables: format!("{} ~ {}", a, b),
            correlation: round_to(score, 3),
        })
        .collect()
}
