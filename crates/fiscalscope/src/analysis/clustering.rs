//! Clustering of complete numeric rows with silhouette-based model selection.
//!
//! The clustering algorithm sits behind [`ClusteringBackend`] so the analyzer
//! can run without one; the built-in [`KMeans`] backend is compiled with the
//! `clustering` feature (on by default).

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use super::stats::{round_to, RunningStats};
use crate::input::Dataset;

/// Seed used wherever clustering needs randomness.
pub const CLUSTER_SEED: u64 = 42;

/// Minimum number of complete rows.
pub const MIN_CLUSTER_ROWS: usize = 50;

/// Rows kept after subsampling.
pub const MAX_CLUSTER_ROWS: usize = 5000;

/// Exclusive upper bound on the number of clusters tried.
pub const MAX_CLUSTERS: usize = 6;

/// A clustering algorithm.
pub trait ClusteringBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Assign each row to one of `k` clusters. `None` if the fit fails.
    fn fit_predict(&self, data: &[Vec<f64>], k: usize, seed: u64) -> Option<Vec<usize>>;
}

/// Outcome of [`detect_clusters`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClusterReport {
    Ok {
        k: usize,
        /// Mean silhouette, 3 decimals.
        silhouette: f64,
        /// Row count per cluster label.
        cluster_sizes: BTreeMap<usize, usize>,
    },
    MissingDependency,
    NotEnoughFeatures,
    NotEnoughRows,
    ScalingFailed {
        error: String,
    },
    NoCluster,
}

impl ClusterReport {
    pub fn status(&self) -> &'static str {
        match self {
            ClusterReport::Ok { .. } => "ok",
            ClusterReport::MissingDependency => "missing_dependency",
            ClusterReport::NotEnoughFeatures => "not_enough_features",
            ClusterReport::NotEnoughRows => "not_enough_rows",
            ClusterReport::ScalingFailed { .. } => "scaling_failed",
            ClusterReport::NoCluster => "no_cluster",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ClusterReport::Ok { .. })
    }
}

/// Find the number of clusters with the best silhouette.
///
/// Uses rows complete across `numeric_columns`, subsampled to 5000 with a
/// fixed seed and standardized before fitting k in `2..min(6, rows)`.
pub fn detect_clusters(
    dataset: &Dataset,
    numeric_columns: &[String],
    backend: Option<&dyn ClusteringBackend>,
) -> ClusterReport {
    let Some(backend) = backend else {
        return ClusterReport::MissingDependency;
    };
    if numeric_columns.len() < 2 {
        return ClusterReport::NotEnoughFeatures;
    }

    let mut rows = complete_rows(dataset, numeric_columns);
    if rows.len() < MIN_CLUSTER_ROWS {
        debug!(rows = rows.len(), "not enough complete rows to cluster");
        return ClusterReport::NotEnoughRows;
    }
    if rows.len() > MAX_CLUSTER_ROWS {
        rows = subsample(rows, MAX_CLUSTER_ROWS, CLUSTER_SEED);
    }

    let scaled = match standardize(&rows) {
        Ok(scaled) => scaled,
        Err(error) => {
            warn!(%error, "feature scaling failed");
            return ClusterReport::ScalingFailed { error };
        }
    };

    let mut best: Option<(usize, f64, Vec<usize>)> = None;
    for k in 2..MAX_CLUSTERS.min(scaled.len()) {
        let Some(labels) = backend.fit_predict(&scaled, k, CLUSTER_SEED) else {
            debug!(backend = backend.name(), k, "clustering fit failed");
            continue;
        };
        let Some(score) = silhouette_score(&scaled, &labels) else {
            continue;
        };
        debug!(k, score, "silhouette");
        if best.as_ref().map_or(true, |(_, s, _)| score > *s) {
            best = Some((k, score, labels));
        }
    }

    match best {
        Some((k, score, labels)) => {
            let mut cluster_sizes = BTreeMap::new();
            for label in labels {
                *cluster_sizes.entry(label).or_insert(0) += 1;
            }
            ClusterReport::Ok {
                k,
                silhouette: round_to(score, 3),
                cluster_sizes,
            }
        }
        None => ClusterReport::NoCluster,
    }
}

/// Rows where every listed column has a value.
fn complete_rows(dataset: &Dataset, columns: &[String]) -> Vec<Vec<f64>> {
    let values: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|c| dataset.numeric_values(c).unwrap_or_else(|| vec![None; dataset.row_count()]))
        .collect();

    (0..dataset.row_count())
        .filter_map(|row| {
            values
                .iter()
                .map(|col| col[row].filter(|v| v.is_finite()))
                .collect::<Option<Vec<f64>>>()
        })
        .collect()
}

/// Pick `size` rows at random, keeping their original order.
fn subsample(rows: Vec<Vec<f64>>, size: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut indices: Vec<usize> = (0..rows.len()).collect();
    // Partial Fisher-Yates.
    for i in 0..size {
        let j = rng.usize(i..indices.len());
        indices.swap(i, j);
    }
    let mut picked = indices[..size].to_vec();
    picked.sort_unstable();

    let mut rows: Vec<Option<Vec<f64>>> = rows.into_iter().map(Some).collect();
    picked.into_iter().filter_map(|i| rows[i].take()).collect()
}

/// Zero mean, unit population variance per column. Constant columns are
/// only centered.
fn standardize(rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, String> {
    let width = rows.first().map(Vec::len).unwrap_or(0);
    let mut params = Vec::with_capacity(width);
    for col in 0..width {
        let stats: RunningStats = rows.iter().map(|r| r[col]).collect();
        let mean = stats.mean().unwrap_or(0.0);
        let std = stats.population_std().unwrap_or(0.0);
        let scale = if std == 0.0 { 1.0 } else { std };
        if !mean.is_finite() || !scale.is_finite() {
            return Err(format!("non-finite scaling parameters for feature {}", col));
        }
        params.push((mean, scale));
    }

    Ok(rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(&params)
                .map(|(v, (mean, scale))| (v - mean) / scale)
                .collect()
        })
        .collect())
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

/// Mean silhouette coefficient over all rows.
///
/// `None` unless the labels form between 2 and `n - 1` clusters. Rows alone
/// in their cluster score 0.
pub fn silhouette_score(data: &[Vec<f64>], labels: &[usize]) -> Option<f64> {
    let n = data.len();
    if n != labels.len() || n < 3 {
        return None;
    }
    let n_clusters = labels.iter().copied().max()? + 1;
    let mut sizes = vec![0usize; n_clusters];
    for &label in labels {
        sizes[label] += 1;
    }
    let used = sizes.iter().filter(|&&s| s > 0).count();
    if used < 2 || used > n - 1 {
        return None;
    }

    let mut total = 0.0;
    let mut sums = vec![0.0; n_clusters];
    for i in 0..n {
        sums.iter_mut().for_each(|s| *s = 0.0);
        for j in 0..n {
            if i != j {
                sums[labels[j]] += distance(&data[i], &data[j]);
            }
        }

        let own = labels[i];
        if sizes[own] <= 1 {
            continue;
        }
        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..n_clusters)
            .filter(|&c| c != own && sizes[c] > 0)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    Some(total / n as f64)
}

// =============================================================================
// K-MEANS
// =============================================================================

/// Lloyd's k-means with k-means++ seeding and several restarts.
#[cfg(feature = "clustering")]
#[derive(Debug, Clone)]
pub struct KMeans {
    /// Number of seeded restarts; the lowest inertia wins.
    pub n_init: usize,
    pub max_iter: usize,
    /// Convergence threshold on total centroid movement.
    pub tolerance: f64,
}

#[cfg(feature = "clustering")]
impl KMeans {
    pub fn new() -> Self {
        Self {
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
        }
    }

    fn init_centroids(&self, data: &[Vec<f64>], k: usize, rng: &mut fastrand::Rng) -> Vec<Vec<f64>> {
        let mut centroids = vec![data[rng.usize(0..data.len())].clone()];
        let mut closest: Vec<f64> = data.iter().map(|p| sq_distance(p, &centroids[0])).collect();

        while centroids.len() < k {
            let total: f64 = closest.iter().sum();
            let next = if total > 0.0 {
                let mut target = rng.f64() * total;
                let mut chosen = data.len() - 1;
                for (i, d) in closest.iter().enumerate() {
                    if target < *d {
                        chosen = i;
                        break;
                    }
                    target -= d;
                }
                chosen
            } else {
                rng.usize(0..data.len())
            };

            let centroid = data[next].clone();
            for (d, p) in closest.iter_mut().zip(data) {
                *d = d.min(sq_distance(p, &centroid));
            }
            centroids.push(centroid);
        }

        centroids
    }

    fn run_once(&self, data: &[Vec<f64>], k: usize, rng: &mut fastrand::Rng) -> (Vec<usize>, f64) {
        let width = data[0].len();
        let mut centroids = self.init_centroids(data, k, rng);
        let mut labels = vec![0usize; data.len()];

        for _ in 0..self.max_iter {
            for (label, point) in labels.iter_mut().zip(data) {
                *label = nearest(point, &centroids).0;
            }

            let mut sums = vec![vec![0.0; width]; k];
            let mut counts = vec![0usize; k];
            for (point, &label) in data.iter().zip(&labels) {
                counts[label] += 1;
                for (s, v) in sums[label].iter_mut().zip(point) {
                    *s += v;
                }
            }

            let mut shift = 0.0;
            for c in 0..k {
                // Empty clusters keep their previous centroid.
                if counts[c] == 0 {
                    continue;
                }
                let updated: Vec<f64> = sums[c].iter().map(|s| s / counts[c] as f64).collect();
                shift += sq_distance(&updated, &centroids[c]);
                centroids[c] = updated;
            }

            if shift <= self.tolerance {
                break;
            }
        }

        let mut inertia = 0.0;
        for (label, point) in labels.iter_mut().zip(data) {
            let (nearest_label, dist) = nearest(point, &centroids);
            *label = nearest_label;
            inertia += dist;
        }
        (labels, inertia)
    }
}

#[cfg(feature = "clustering")]
impl Default for KMeans {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "clustering")]
impl ClusteringBackend for KMeans {
    fn name(&self) -> &str {
        "kmeans"
    }

    fn fit_predict(&self, data: &[Vec<f64>], k: usize, seed: u64) -> Option<Vec<usize>> {
        if k == 0 || data.len() < k || data.first().map_or(true, Vec::is_empty) {
            return None;
        }

        let mut rng = fastrand::Rng::with_seed(seed);
        let mut best: Option<(Vec<usize>, f64)> = None;
        for _ in 0..self.n_init {
            let (labels, inertia) = self.run_once(data, k, &mut rng);
            if best.as_ref().map_or(true, |(_, b)| inertia < *b) {
                best = Some((labels, inertia));
            }
        }
        best.map(|(labels, _)| labels)
    }
}

#[cfg(feature = "clustering")]
fn sq_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

#[cfg(feature = "clustering")]
fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, sq_distance(point, c)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}
