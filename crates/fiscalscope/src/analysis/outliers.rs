//! IQR outlier detection.

use serde::Serialize;
use tracing::{debug, warn};

use super::stats::{mean, round_to};
use crate::input::Dataset;
use crate::schema::NumericSummary;

/// Default IQR fence multiplier.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Minimum non-null values before a column is tested.
pub const MIN_OUTLIER_VALUES: usize = 8;

/// Outliers found in one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub column: String,
    /// Number of flagged values.
    pub count: usize,
    /// Flagged share of non-null values, in percent (2 decimals).
    pub percentage: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// `mean(all) - mean(unflagged)`.
    pub mean_shift: f64,
}

/// Flag values outside `[Q1 - k*IQR, Q3 + k*IQR]` in each listed column.
///
/// Columns with fewer than 8 values, a zero IQR or no flagged value are
/// left out of the result.
pub fn detect_outliers(dataset: &Dataset, numeric_columns: &[String], multiplier: f64) -> Vec<OutlierReport> {
    let mut reports = Vec::new();

    for column in numeric_columns {
        let Some(values) = dataset.numeric_values(column) else {
            warn!(column = %column, "outlier detection skipped: column not found");
            continue;
        };
        let values: Vec<f64> = values.into_iter().flatten().filter(|v| v.is_finite()).collect();
        if values.len() < MIN_OUTLIER_VALUES {
            debug!(column = %column, values = values.len(), "too few values for outlier detection");
            continue;
        }

        if let Some(report) = column_outliers(column, &values, multiplier) {
            reports.push(report);
        }
    }

    reports
}

fn column_outliers(column: &str, values: &[f64], multiplier: f64) -> Option<OutlierReport> {
    let summary = NumericSummary::from_values(values)?;
    let iqr = summary.iqr();
    if iqr == 0.0 || !iqr.is_finite() {
        debug!(column, "zero IQR, outlier detection skipped");
        return None;
    }

    let (lower, upper) = summary.iqr_bounds(multiplier);
    let (flagged, kept): (Vec<f64>, Vec<f64>) =
        values.iter().partition(|&&v| summary.is_outlier_iqr(v, multiplier));
    if flagged.is_empty() {
        return None;
    }

    // NaN when every value is flagged, like a mean over an empty series.
    let shift = summary.mean - mean(&kept).unwrap_or(f64::NAN);

    Some(OutlierReport {
        column: column.to_string(),
        count: flagged.len(),
        percentage: round_to(flagged.len() as f64 / values.len() as f64 * 100.0, 2),
        lower_bound: lower,
        upper_bound: upper,
        mean_shift: shift,
    })
}
