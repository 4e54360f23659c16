//! clusterpad: k-means clustering for pasted numeric vectors
//!
//! Text goes in, is parsed into a matrix, partitioned into k clusters with
//! k-means++ seeded Lloyd iteration, and comes back out as centroid text,
//! per-row assignments and (for 1-D/2-D data) plot-ready point groups.

pub mod cli;
pub mod data;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod projection;
pub mod session;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{load_matrix, parse_matrix, Matrix};
pub use error::ClusterError;
pub use model::{fit_kmeans, KMeansModel, KMeansParams};
pub use pipeline::{run_pipeline, PipelineConfig, PipelineOutput};
pub use projection::{project, serialize_assignments, serialize_centroids, PlotSeries};
pub use session::{RunOutcome, Session};
pub use viz::render_scatter;

/// Common result type used throughout the library
pub type Result<T> = std::result::Result<T, ClusterError>;
