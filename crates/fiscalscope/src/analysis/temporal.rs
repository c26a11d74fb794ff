//! Monotonic trends of numeric columns over date columns.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use super::stats::{pairwise_complete, spearman};
use crate::input::Dataset;
use crate::schema::{day_ordinal, ColumnClassifier, TEMPORAL_MIN_PARSED_ROWS};

/// Minimum distinct numeric values among valid-date rows.
pub const MIN_DISTINCT_VALUES: usize = 5;

/// Minimum |rho| reported as a trend.
pub const TREND_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
}

impl TrendDirection {
    /// Label used in report text.
    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "crescente",
            TrendDirection::Decreasing => "decrescente",
        }
    }
}

/// A numeric column moving monotonically with a date column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalTrend {
    pub temporal_column: String,
    pub numeric_column: String,
    pub rho: f64,
    pub direction: TrendDirection,
}

impl TemporalTrend {
    pub fn insight(&self) -> String {
        format!(
            "{} tem tendência {} em relação a {} (rho≈{:.2}).",
            self.numeric_column,
            self.direction.label(),
            self.temporal_column,
            self.rho
        )
    }
}

/// Temporal columns found and the trends detected over them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemporalPatterns {
    pub columns: Vec<String>,
    pub trends: Vec<TemporalTrend>,
    pub insights: Vec<String>,
}

/// Spearman correlation between each numeric column and each date column.
pub fn detect_temporal_patterns(
    dataset: &Dataset,
    numeric_columns: &[String],
    classifier: &ColumnClassifier,
) -> TemporalPatterns {
    let temporal = classifier.temporal_columns(dataset, numeric_columns);
    let mut patterns = TemporalPatterns {
        columns: temporal.keys().cloned().collect(),
        ..TemporalPatterns::default()
    };

    for (date_column, parsed) in &temporal {
        let ordinals: Vec<Option<f64>> = parsed
            .iter()
            .map(|d| d.as_ref().map(|d| day_ordinal(d) as f64))
            .collect();
        let valid = ordinals.iter().filter(|o| o.is_some()).count();
        if valid < TEMPORAL_MIN_PARSED_ROWS {
            continue;
        }

        for numeric_column in numeric_columns {
            let Some(values) = dataset.numeric_values(numeric_column) else {
                continue;
            };

            let distinct: HashSet<u64> = values
                .iter()
                .zip(&ordinals)
                .filter_map(|(v, o)| o.and(*v))
                .map(f64::to_bits)
                .collect();
            if distinct.len() < MIN_DISTINCT_VALUES {
                continue;
            }

            let (x, y) = pairwise_complete(&values, &ordinals);
            let Some(rho) = spearman(&x, &y) else {
                continue;
            };
            if rho.abs() < TREND_THRESHOLD {
                continue;
            }

            debug!(date_column = %date_column, numeric_column = %numeric_column, rho, "temporal trend");
            let trend = TemporalTrend {
                temporal_column: date_column.clone(),
                numeric_column: numeric_column.clone(),
                rho,
                direction: if rho > 0.0 {
                    TrendDirection::Increasing
                } else {
                    TrendDirection::Decreasing
                },
            };
            patterns.insights.push(trend.insight());
            patterns.trends.push(trend);
        }
    }

    patterns
}
