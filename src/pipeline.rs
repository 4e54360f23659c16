//! One-shot pipeline: text in, centroids / assignments / plot out
//!
//! Steps run in a fixed order and every check happens before any clustering
//! work: parse the matrix, skip when it has fewer than 2 rows, parse and
//! validate the cluster count, fit, then project.

use crate::data::{parse_matrix, Matrix, DEFAULT_SEPARATOR};
use crate::error::ClusterError;
use crate::model::{fit_kmeans, KMeansModel, KMeansParams, DEFAULT_MAX_ITER};
use crate::projection::{project, serialize_assignments, serialize_centroids, PlotSeries};
use tracing::{debug, info};

/// Settings shared by every run of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Field separator for both input and output text
    pub separator: char,
    /// Iteration cap for the clustering engine
    pub max_iter: usize,
    /// Fixed seed; `None` draws a fresh seed per run
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            max_iter: DEFAULT_MAX_ITER,
            seed: None,
        }
    }
}

impl PipelineConfig {
    /// Engine parameters for `k` clusters under this configuration.
    pub fn kmeans_params(&self, k: usize) -> KMeansParams {
        KMeansParams::new(k)
            .with_max_iter(self.max_iter)
            .with_seed_opt(self.seed)
    }
}

/// Everything a completed run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub matrix: Matrix,
    pub model: KMeansModel,
    /// Centroids, one per line, in the input format
    pub centroid_text: String,
    /// One cluster index per line, in input row order
    pub assignment_text: String,
    /// Rows grouped by cluster; `None` when the data is not 1-D or 2-D
    pub plot: Option<PlotSeries>,
}

/// Parse a cluster count typed as text.
///
/// Surrounding whitespace is ignored; anything other than a base-10 integer
/// is [`ClusterError::MalformedClusterCount`]. Range is checked separately by
/// [`validate_cluster_count`].
pub fn parse_cluster_count(text: &str) -> crate::Result<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| ClusterError::MalformedClusterCount(text.to_string()))
}

/// Check `1 <= requested <= rows`.
pub fn validate_cluster_count(requested: i64, rows: usize) -> crate::Result<usize> {
    match usize::try_from(requested) {
        Ok(k) if k >= 1 && k <= rows => Ok(k),
        _ => Err(ClusterError::InvalidClusterCount { requested, rows }),
    }
}

/// Run the whole pipeline on raw text.
///
/// # Errors
/// * [`ClusterError::InsufficientData`] when the text holds fewer than 2 rows
/// * [`ClusterError::MalformedClusterCount`] / [`ClusterError::InvalidClusterCount`]
///   for a bad cluster count
pub fn run_pipeline(
    text: &str,
    cluster_count: &str,
    config: &PipelineConfig,
) -> crate::Result<PipelineOutput> {
    let matrix = parse_matrix(text, config.separator);
    run_on_matrix(matrix, cluster_count, config)
}

/// Same as [`run_pipeline`] for an already parsed matrix.
pub fn run_on_matrix(
    matrix: Matrix,
    cluster_count: &str,
    config: &PipelineConfig,
) -> crate::Result<PipelineOutput> {
    let rows = matrix.nrows();
    if rows <= 1 {
        debug!(rows, "skipping clustering: not enough rows");
        return Err(ClusterError::InsufficientData { rows });
    }

    let requested = parse_cluster_count(cluster_count)?;
    let k = validate_cluster_count(requested, rows)?;

    let model = fit_kmeans(&matrix, &config.kmeans_params(k))?;

    let centroid_text = serialize_centroids(&model.centroids, config.separator);
    let labels = model.labels.to_vec();
    let assignment_text = serialize_assignments(&labels);
    let plot = project(&matrix, &labels, k);

    info!(
        rows,
        dim = matrix.dim(),
        k,
        plotted = plot.is_some(),
        "pipeline run complete"
    );

    Ok(PipelineOutput {
        matrix,
        model,
        centroid_text,
        assignment_text,
        plot,
    })
}
