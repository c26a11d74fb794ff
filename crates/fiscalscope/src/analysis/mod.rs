//! Exploratory statistics: overview, outliers, temporal trends, value
//! frequencies, relationships and clustering.

mod analyzer;
pub mod clustering;
mod frequency;
mod outliers;
mod overview;
mod relationships;
pub mod stats;
mod temporal;

pub use analyzer::{coerce_numeric, AdvancedAnalysis, StatisticalAnalyzer, COERCE_MIN_SHARE};
#[cfg(feature = "clustering")]
pub use clustering::KMeans;
pub use clustering::{silhouette_score, ClusterReport, ClusteringBackend};
pub use frequency::{identify_value_frequencies, FrequencyRow};
pub use outliers::{detect_outliers, OutlierReport, IQR_MULTIPLIER, MIN_OUTLIER_VALUES};
pub use overview::{overview, CorrelationMatrix, MissingShare, OverviewReport};
pub use relationships::{
    select_correlations, summarize_relationships, CategoricalDriver, CorrelationPair,
    RelationshipSummary, MIN_CORRELATION,
};
pub use temporal::{detect_temporal_patterns, TemporalPatterns, TemporalTrend, TrendDirection};
