//! Statistical analyzer tying the individual analyses together.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use super::clustering::{self, ClusterReport, ClusteringBackend};
use super::frequency::{self, FrequencyRow};
use super::outliers::{self, OutlierReport, IQR_MULTIPLIER};
use super::overview::{self, OverviewReport};
use super::relationships::{self, RelationshipSummary};
use super::temporal::{self, TemporalPatterns};
use crate::input::{parse_finite, Cell, Dataset};
use crate::schema::ColumnClassifier;

static NUMERIC_LIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?\d*(?:\.\d+)?$").unwrap());

/// Share of values that must look numeric before a text column is coerced.
pub const COERCE_MIN_SHARE: f64 = 0.8;

/// All exploratory analyses of a dataset, computed together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvancedAnalysis {
    pub numeric_columns: Vec<String>,
    pub non_numeric_columns: Vec<String>,
    pub temporal: TemporalPatterns,
    pub frequencies: Vec<FrequencyRow>,
    pub outliers: Vec<OutlierReport>,
    pub clusters: ClusterReport,
    pub relationships: RelationshipSummary,
}

/// Runs the exploratory analyses.
///
/// Clustering goes through an optional [`ClusteringBackend`]; with the
/// `clustering` feature the built-in k-means backend is installed by default.
#[derive(Clone)]
pub struct StatisticalAnalyzer {
    classifier: ColumnClassifier,
    clustering: Option<Arc<dyn ClusteringBackend>>,
    iqr_multiplier: f64,
}

impl StatisticalAnalyzer {
    /// Create an analyzer with default settings.
    pub fn new() -> Self {
        Self {
            classifier: ColumnClassifier::new(),
            clustering: default_backend(),
            iqr_multiplier: IQR_MULTIPLIER,
        }
    }

    /// Use a custom clustering backend.
    pub fn with_clustering_backend(mut self, backend: impl ClusteringBackend + 'static) -> Self {
        self.clustering = Some(Arc::new(backend));
        self
    }

    /// Run without clustering; [`detect_clusters`](Self::detect_clusters)
    /// then reports `missing_dependency`.
    pub fn without_clustering(mut self) -> Self {
        self.clustering = None;
        self
    }

    /// Set the IQR fence multiplier.
    pub fn with_iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = multiplier;
        self
    }

    pub fn classifier(&self) -> &ColumnClassifier {
        &self.classifier
    }

    /// Shape, per-column descriptions, missingness and correlation matrix.
    pub fn overview(&self, dataset: &Dataset) -> OverviewReport {
        let numeric = self.classifier.numeric_columns(dataset);
        let non_numeric = self.classifier.non_numeric_columns(dataset);
        overview::overview(dataset, &numeric, &non_numeric)
    }

    pub fn detect_outliers(&self, dataset: &Dataset, numeric_columns: &[String]) -> Vec<OutlierReport> {
        outliers::detect_outliers(dataset, numeric_columns, self.iqr_multiplier)
    }

    pub fn detect_temporal_patterns(&self, dataset: &Dataset, numeric_columns: &[String]) -> TemporalPatterns {
        temporal::detect_temporal_patterns(dataset, numeric_columns, &self.classifier)
    }

    pub fn identify_value_frequencies(&self, dataset: &Dataset) -> Vec<FrequencyRow> {
        frequency::identify_value_frequencies(dataset)
    }

    pub fn detect_clusters(&self, dataset: &Dataset, numeric_columns: &[String]) -> ClusterReport {
        clustering::detect_clusters(dataset, numeric_columns, self.clustering.as_deref())
    }

    pub fn summarize_relationships(
        &self,
        dataset: &Dataset,
        numeric_columns: &[String],
        categorical_columns: &[String],
    ) -> RelationshipSummary {
        relationships::summarize_relationships(dataset, numeric_columns, categorical_columns)
    }

    /// Temporal patterns, frequencies, outliers, clusters and relationships
    /// in one pass over the classified columns.
    pub fn compute_advanced_analysis(&self, dataset: &Dataset) -> AdvancedAnalysis {
        let numeric = self.classifier.numeric_columns(dataset);
        let non_numeric = self.classifier.non_numeric_columns(dataset);
        info!(
            rows = dataset.row_count(),
            numeric = numeric.len(),
            non_numeric = non_numeric.len(),
            "running advanced analysis"
        );

        AdvancedAnalysis {
            temporal: self.detect_temporal_patterns(dataset, &numeric),
            frequencies: self.identify_value_frequencies(dataset),
            outliers: self.detect_outliers(dataset, &numeric),
            clusters: self.detect_clusters(dataset, &numeric),
            relationships: self.summarize_relationships(dataset, &numeric, &non_numeric),
            numeric_columns: numeric,
            non_numeric_columns: non_numeric,
        }
    }
}

impl Default for StatisticalAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StatisticalAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticalAnalyzer")
            .field("clustering", &self.clustering.as_ref().map(|b| b.name().to_string()))
            .field("iqr_multiplier", &self.iqr_multiplier)
            .finish()
    }
}

#[cfg(feature = "clustering")]
fn default_backend() -> Option<Arc<dyn ClusteringBackend>> {
    Some(Arc::new(clustering::KMeans::new()))
}

#[cfg(not(feature = "clustering"))]
fn default_backend() -> Option<Arc<dyn ClusteringBackend>> {
    None
}

/// Convert text columns that hold numbers into numeric columns.
///
/// A column qualifies when more than 80% of its values look numeric once
/// decimal commas become points, and every non-null value then parses.
pub fn coerce_numeric(dataset: Dataset) -> Dataset {
    let mut changed = false;
    let columns: Vec<(String, Vec<Cell>)> = dataset
        .columns()
        .map(|(name, cells)| match coerce_column(cells) {
            Some(coerced) => {
                debug!(column = name, "coerced to numeric");
                changed = true;
                (name.to_string(), coerced)
            }
            None => (name.to_string(), cells.to_vec()),
        })
        .collect();

    if !changed {
        return dataset;
    }
    Dataset::from_columns(columns).unwrap_or(dataset)
}

fn coerce_column(cells: &[Cell]) -> Option<Vec<Cell>> {
    if !cells.iter().any(|c| matches!(c, Cell::Text(_))) {
        return None;
    }

    let texts: Vec<Option<String>> = cells
        .iter()
        .map(|c| (!c.is_null()).then(|| c.to_text().replace(',', ".")))
        .collect();

    let looks_numeric = texts
        .iter()
        .filter(|t| t.as_deref().is_some_and(|t| NUMERIC_LIKE.is_match(t)))
        .count();
    if (looks_numeric as f64 / cells.len() as f64) <= COERCE_MIN_SHARE {
        return None;
    }

    texts
        .into_iter()
        .map(|t| match t {
            None => Some(Cell::Null),
            Some(t) => parse_finite(&t).map(Cell::Number),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_numeric_decimal_comma() {
        let ds = Dataset::from_columns(vec![
            (
                "valor",
                vec![
                    Cell::text("10,5"),
                    Cell::text("3"),
                    Cell::text("7,25"),
                    Cell::text("1"),
                    Cell::text("2"),
                    Cell::Null,
                ],
            ),
            ("nome", ["a", "b", "c", "d", "e", "f"].into_iter().map(Cell::text).collect()),
        ])
        .unwrap();

        let coerced = coerce_numeric(ds);
        assert_eq!(coerced.cell(0, "valor"), Some(&Cell::Number(10.5)));
        assert_eq!(coerced.cell(5, "valor"), Some(&Cell::Null));
        assert_eq!(coerced.cell(0, "nome"), Some(&Cell::text("a")));
        assert_eq!(coerced.column_names().collect::<Vec<_>>(), vec!["valor", "nome"]);
    }

    #[test]
    fn test_coerce_requires_all_values_to_parse() {
        let mut cells: Vec<Cell> = (0..9).map(|i| Cell::text(i.to_string())).collect();
        cells.push(Cell::text("dez"));
        let ds = Dataset::from_columns(vec![("n", cells)]).unwrap();
        let coerced = coerce_numeric(ds);
        assert_eq!(coerced.cell(0, "n"), Some(&Cell::text("0")));
    }

    #[test]
    fn test_without_clustering_reports_missing_dependency() {
        let analyzer = StatisticalAnalyzer::new().without_clustering();
        let ds = Dataset::from_columns(vec![("x", vec![Cell::Number(1.0)])]).unwrap();
        let report = analyzer.detect_clusters(&ds, &["x".to_string(), "y".to_string()]);
        assert_eq!(report, ClusterReport::MissingDependency);
    }

    #[test]
    fn test_advanced_analysis_bundle() {
        let n = 12;
        let ds = Dataset::from_columns(vec![
            (
                "data",
                (1..=n).map(|d| Cell::text(format!("2024-05-{:02}", d))).collect::<Vec<_>>(),
            ),
            ("valor", (1..=n).map(|v| Cell::Number(v as f64)).collect()),
            ("uf", (1..=n).map(|i| Cell::text(if i % 2 == 0 { "SP" } else { "RJ" })).collect()),
        ])
        .unwrap();

        let analysis = StatisticalAnalyzer::new().compute_advanced_analysis(&ds);
        assert_eq!(analysis.numeric_columns, vec!["valor"]);
        assert_eq!(analysis.non_numeric_columns, vec!["data", "uf"]);
        assert_eq!(analysis.temporal.columns, vec!["data"]);
        assert_eq!(analysis.frequencies.len(), 3);
        assert!(analysis.outliers.is_empty());
        assert!(!analysis.clusters.is_ok());
        // Every date is its own category, so it leads the drivers.
        assert_eq!(analysis.relationships.categorical.len(), 2);
        assert_eq!(analysis.relationships.categorical[0].driver, "data");
        assert_eq!(analysis.relationships.categorical[1].driver, "uf");
    }
}
