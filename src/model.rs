//! K-Means clustering engine
//!
//! Centroids are seeded with k-means++ and refined with Lloyd's algorithm:
//!
//! 1. **Seed**: first centroid uniformly at random, each further centroid drawn
//!    with probability proportional to its squared distance to the nearest
//!    centroid chosen so far
//! 2. **Assign**: every row goes to its nearest centroid (squared Euclidean)
//! 3. **Update**: every centroid becomes the mean of its rows
//! 4. Repeat 2-3 until no row changes cluster or `max_iter` passes ran
//!
//! Empty clusters are reseeded with the row farthest from its current centroid
//! (taken from a cluster that keeps at least one other row), so no cluster is
//! ever returned empty and the within-cluster sum of squares never increases
//! from one pass to the next.
//!
//! Inputs with magnitudes near the top of the `f64` range are refined on a
//! copy scaled by a power of two, so squared distances and per-cluster sums
//! stay finite. Power-of-two scaling is exact, and the centroids are scaled
//! back before they are returned.

use crate::data::Matrix;
use crate::error::ClusterError;
use ndarray::{Array1, Array2, ArrayView1};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use tracing::{debug, info};

/// Iteration cap used when none is configured.
pub const DEFAULT_MAX_ITER: usize = 300;

/// Exponent of the largest magnitude refined without rescaling; beyond
/// `2^512` a squared difference overflows.
const SAFE_EXPONENT: i32 = 500;

/// Exponent of the downscale factor applied past [`SAFE_EXPONENT`].
const DOWNSCALE_EXPONENT: i32 = -600;

/// Parameters for a single k-means run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KMeansParams {
    k: usize,
    max_iter: usize,
    seed: Option<u64>,
}

impl KMeansParams {
    /// Parameters for `k` clusters with the default iteration cap and a
    /// random seed.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: DEFAULT_MAX_ITER,
            seed: None,
        }
    }

    /// Set the maximum number of refinement passes.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Pin the random seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replace the seed; `None` draws a fresh one per run.
    pub fn with_seed_opt(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

/// Result of a k-means run.
#[derive(Debug, Clone)]
pub struct KMeansModel {
    /// Number of clusters
    pub n_clusters: usize,
    /// Cluster index of every input row, in row order
    pub labels: Array1<usize>,
    /// One centroid per cluster, each the mean of its rows
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares of the final assignment
    pub inertia: f64,
    /// Within-cluster sum of squares after every update pass
    pub inertia_history: Vec<f64>,
    /// Number of refinement passes run
    pub n_iterations: usize,
    /// Whether the last pass left every assignment unchanged
    pub converged: bool,
    /// How many times an empty cluster had to be reseeded
    pub reseeds: usize,
    /// Seed the run used; feed it back through [`KMeansParams::with_seed`] to reproduce
    pub seed: u64,
}

impl KMeansModel {
    /// Dimensionality of the centroids.
    pub fn dim(&self) -> usize {
        self.centroids.ncols()
    }

    /// Predict the cluster of a new vector.
    pub fn predict(&self, features: &[f64]) -> crate::Result<usize> {
        if features.len() != self.dim() {
            return Err(ClusterError::DimensionMismatch {
                expected: self.dim(),
                found: features.len(),
            });
        }

        let point = ArrayView1::from(features);
        let (cluster, _) = nearest_centroid(&point, &self.centroids, None);
        Ok(cluster)
    }

    /// Get cluster sizes
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in self.labels.iter() {
            if label < self.n_clusters {
                sizes[label] += 1;
            }
        }
        sizes
    }

    /// Compute basic silhouette coefficient for the first `sample_size` rows
    pub fn compute_silhouette_sample(&self, matrix: &Matrix, sample_size: usize) -> f64 {
        let n_samples = matrix.nrows().min(sample_size).min(self.labels.len());
        if n_samples < 2 {
            return 0.0;
        }

        let mut silhouette_sum = 0.0;

        for i in 0..n_samples {
            let point = matrix.row(i);
            let cluster_label = self.labels[i];

            // a(i): mean distance to points in the same cluster
            let mut same_cluster_distances = Vec::new();
            let mut other_cluster_distances: Vec<Vec<f64>> = vec![Vec::new(); self.n_clusters];

            for j in 0..n_samples {
                if i == j {
                    continue;
                }

                let distance = squared_distance(&point, &matrix.row(j)).sqrt();
                let other_label = self.labels[j];

                if other_label == cluster_label {
                    same_cluster_distances.push(distance);
                } else if other_label < self.n_clusters {
                    other_cluster_distances[other_label].push(distance);
                }
            }

            let a_i = if same_cluster_distances.is_empty() {
                0.0
            } else {
                same_cluster_distances.iter().sum::<f64>() / same_cluster_distances.len() as f64
            };

            // b(i): smallest mean distance to another cluster
            let b_i = other_cluster_distances
                .iter()
                .filter(|distances| !distances.is_empty())
                .map(|distances| distances.iter().sum::<f64>() / distances.len() as f64)
                .fold(f64::INFINITY, f64::min);

            let silhouette_i = if b_i.is_infinite() || (a_i == 0.0 && b_i == 0.0) {
                0.0
            } else {
                (b_i - a_i) / a_i.max(b_i)
            };

            silhouette_sum += silhouette_i;
        }

        silhouette_sum / n_samples as f64
    }
}

/// Fit k-means on a matrix.
///
/// # Errors
/// * [`ClusterError::InsufficientData`] when the matrix has fewer than 2 rows
/// * [`ClusterError::InvalidClusterCount`] when `k` is 0 or exceeds the row count
pub fn fit_kmeans(matrix: &Matrix, params: &KMeansParams) -> crate::Result<KMeansModel> {
    let n = matrix.nrows();
    if n < 2 {
        return Err(ClusterError::InsufficientData { rows: n });
    }

    let k = params.k;
    if k == 0 || k > n {
        return Err(ClusterError::InvalidClusterCount {
            requested: k as i64,
            rows: n,
        });
    }

    let seed = params.seed.unwrap_or_else(|| thread_rng().gen());
    let mut rng = StdRng::seed_from_u64(seed);

    let scale = working_scale(matrix.as_array());
    let rescaled;
    let data = if scale == 1.0 {
        matrix.as_array()
    } else {
        rescaled = matrix.as_array() * scale;
        &rescaled
    };

    debug!(rows = n, dim = matrix.dim(), k, seed, scale, "fitting k-means");

    let mut centroids = init_centroids(data, k, &mut rng);
    let mut labels = vec![0usize; n];
    assign_rows(data, &centroids, &mut labels, false);

    let mut inertia_history = Vec::new();
    let mut reseeds = 0;
    let mut n_iterations = 0;
    let mut converged = false;

    while n_iterations < params.max_iter {
        n_iterations += 1;

        reseeds += reseed_empty_clusters(data, &mut centroids, &mut labels);
        update_centroids(data, &labels, &mut centroids);
        inertia_history.push(compute_inertia(data, &labels, &centroids));

        let changed = assign_rows(data, &centroids, &mut labels, true);
        debug!(iteration = n_iterations, changed, "refinement pass");
        if changed == 0 {
            converged = true;
            break;
        }
    }

    if !converged {
        // The final assignment pass may have emptied a cluster and moved rows
        // away from the current means.
        reseeds += reseed_empty_clusters(data, &mut centroids, &mut labels);
        update_centroids(data, &labels, &mut centroids);
        inertia_history.push(compute_inertia(data, &labels, &centroids));
    }

    if scale != 1.0 {
        centroids.mapv_inplace(|value| value / scale);
        for inertia in inertia_history.iter_mut() {
            *inertia = *inertia / scale / scale;
        }
    }

    let inertia = inertia_history.last().copied().unwrap_or(0.0);

    info!(
        k,
        rows = n,
        iterations = n_iterations,
        converged,
        reseeds,
        inertia,
        seed,
        "k-means finished"
    );

    Ok(KMeansModel {
        n_clusters: k,
        labels: Array1::from(labels),
        centroids,
        inertia,
        inertia_history,
        n_iterations,
        converged,
        reseeds,
        seed,
    })
}

/// Choose `k` distinct rows as initial centroids with k-means++.
fn init_centroids(data: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = data.nrows();
    let mut centroids = Array2::zeros((k, data.ncols()));
    let mut chosen = vec![false; n];

    let first = rng.gen_range(0..n);
    chosen[first] = true;
    centroids.row_mut(0).assign(&data.row(first));

    // Squared distance from every row to its nearest chosen centroid
    let mut min_distances: Vec<f64> = data
        .outer_iter()
        .map(|row| squared_distance(&row, &data.row(first)))
        .collect();

    for c in 1..k {
        let weights: Vec<f64> = min_distances
            .iter()
            .zip(&chosen)
            .map(|(&d, &taken)| if taken { 0.0 } else { d })
            .collect();

        // WeightedIndex panics on an infinite total instead of returning Err
        let total: f64 = weights.iter().sum();
        let next = if !total.is_finite() {
            farthest_row(&weights)
        } else {
            match WeightedIndex::new(&weights) {
                Ok(dist) => dist.sample(rng),
                Err(_) => {
                    // Every unchosen row coincides with a centroid already taken
                    let remaining: Vec<usize> = (0..n).filter(|&i| !chosen[i]).collect();
                    remaining[rng.gen_range(0..remaining.len())]
                }
            }
        };

        chosen[next] = true;
        centroids.row_mut(c).assign(&data.row(next));

        let centroid = data.row(next);
        for (i, min_distance) in min_distances.iter_mut().enumerate() {
            let distance = squared_distance(&data.row(i), &centroid);
            if distance < *min_distance {
                *min_distance = distance;
            }
        }
    }

    centroids
}

/// Index of the largest weight, lowest index on ties.
fn farthest_row(weights: &[f64]) -> usize {
    weights
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &weight)| {
            if weight > best.1 {
                (i, weight)
            } else {
                best
            }
        })
        .0
}

/// Power-of-two factor that keeps squared distances and sums finite.
fn working_scale(data: &Array2<f64>) -> f64 {
    let max_abs = data.iter().fold(0.0f64, |max, value| max.max(value.abs()));
    if max_abs >= 2f64.powi(SAFE_EXPONENT) {
        2f64.powi(DOWNSCALE_EXPONENT)
    } else {
        1.0
    }
}

/// Assign every row to its nearest centroid, returning how many rows changed.
///
/// With `keep_current` a row stays put when its current cluster is tied for
/// nearest; otherwise ties go to the lowest centroid index.
fn assign_rows(
    data: &Array2<f64>,
    centroids: &Array2<f64>,
    labels: &mut [usize],
    keep_current: bool,
) -> usize {
    let mut changed = 0;
    for (i, label) in labels.iter_mut().enumerate() {
        let incumbent = keep_current.then_some(*label);
        let (nearest, _) = nearest_centroid(&data.row(i), centroids, incumbent);
        if nearest != *label {
            *label = nearest;
            changed += 1;
        }
    }
    changed
}

/// Index and squared distance of the nearest centroid.
fn nearest_centroid(
    point: &ArrayView1<'_, f64>,
    centroids: &Array2<f64>,
    incumbent: Option<usize>,
) -> (usize, f64) {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;

    for (c, centroid) in centroids.outer_iter().enumerate() {
        let distance = squared_distance(point, &centroid);
        if distance < best_distance {
            best_distance = distance;
            best = c;
        }
    }

    if let Some(current) = incumbent.filter(|&c| c < centroids.nrows()) {
        let distance = squared_distance(point, &centroids.row(current));
        if distance <= best_distance {
            return (current, distance);
        }
    }

    (best, best_distance)
}

/// Recompute every centroid as the mean of its rows. Centroids without rows
/// are left as they are.
fn update_centroids(data: &Array2<f64>, labels: &[usize], centroids: &mut Array2<f64>) {
    let k = centroids.nrows();
    let mut sums = Array2::<f64>::zeros((k, data.ncols()));
    let mut counts = vec![0usize; k];

    for (row, &label) in data.outer_iter().zip(labels) {
        let mut sum = sums.row_mut(label);
        sum += &row;
        counts[label] += 1;
    }

    for (c, &count) in counts.iter().enumerate() {
        if count > 0 {
            let mean = &sums.row(c) / count as f64;
            centroids.row_mut(c).assign(&mean);
        }
    }
}

/// Give every empty cluster a row, returning how many clusters were reseeded.
///
/// The donor is the row farthest from its current centroid among clusters
/// with more than one row (lowest row index on ties). The donor moves to the
/// empty cluster, which is re-centred on it.
fn reseed_empty_clusters(
    data: &Array2<f64>,
    centroids: &mut Array2<f64>,
    labels: &mut [usize],
) -> usize {
    let k = centroids.nrows();
    let mut counts = vec![0usize; k];
    for &label in labels.iter() {
        counts[label] += 1;
    }

    let mut reseeded = 0;
    for cluster in 0..k {
        if counts[cluster] > 0 {
            continue;
        }

        let donor = labels
            .iter()
            .enumerate()
            .filter(|&(_, &label)| counts[label] > 1)
            .map(|(i, &label)| (i, squared_distance(&data.row(i), &centroids.row(label))))
            .fold(None, |best: Option<(usize, f64)>, (i, distance)| match best {
                Some((_, best_distance)) if best_distance >= distance => best,
                _ => Some((i, distance)),
            });

        // With k <= n some cluster holds two rows whenever one is empty.
        let Some((row, distance)) = donor else {
            break;
        };

        counts[labels[row]] -= 1;
        counts[cluster] = 1;
        labels[row] = cluster;
        centroids.row_mut(cluster).assign(&data.row(row));
        reseeded += 1;

        debug!(cluster, row, distance, "reseeded empty cluster");
    }

    reseeded
}

/// Compute within-cluster sum of squares (inertia)
pub fn compute_inertia(data: &Array2<f64>, labels: &[usize], centroids: &Array2<f64>) -> f64 {
    data.outer_iter()
        .zip(labels)
        .filter(|(_, &cluster)| cluster < centroids.nrows())
        .map(|(point, &cluster)| squared_distance(&point, &centroids.row(cluster)))
        .sum()
}

/// Squared Euclidean distance between two points
pub fn squared_distance(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}
