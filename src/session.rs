//! Presentation state for one shell instance
//!
//! A [`Session`] owns the text the user edits, the cluster-count text and the
//! outputs of the last successful run. A run either replaces all three
//! outputs together or leaves them exactly as they were.

use crate::data::Matrix;
use crate::model::KMeansModel;
use crate::pipeline::{run_pipeline, PipelineConfig};
use crate::projection::PlotSeries;
use tracing::{debug, warn};

/// Cluster count shown before the user edits it.
pub const DEFAULT_CLUSTER_COUNT: &str = "10";

/// Outputs of the last completed run.
#[derive(Debug, Clone, Default)]
pub struct SessionOutputs {
    pub centroid_text: String,
    pub assignment_text: String,
    pub plot: Option<PlotSeries>,
    /// Matrix the outputs were computed from
    pub matrix: Matrix,
    pub model: Option<KMeansModel>,
}

/// What happened on [`Session::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Outputs were replaced.
    Completed,
    /// Fewer than 2 rows; outputs were left unchanged.
    Skipped { rows: usize },
}

/// Scoped state of one shell instance.
#[derive(Debug, Clone)]
pub struct Session {
    input_text: String,
    cluster_count: String,
    config: PipelineConfig,
    outputs: SessionOutputs,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Session {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            input_text: String::new(),
            cluster_count: DEFAULT_CLUSTER_COUNT.to_string(),
            config,
            outputs: SessionOutputs::default(),
        }
    }

    pub fn set_input_text(&mut self, text: impl Into<String>) {
        self.input_text = text.into();
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn set_cluster_count(&mut self, text: impl Into<String>) {
        self.cluster_count = text.into();
    }

    pub fn cluster_count(&self) -> &str {
        &self.cluster_count
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn outputs(&self) -> &SessionOutputs {
        &self.outputs
    }

    /// Run the pipeline on the current text and cluster count.
    ///
    /// Too few rows is reported as [`RunOutcome::Skipped`]; an invalid cluster
    /// count is returned as an error. In both cases the previous outputs stay.
    pub fn run(&mut self) -> crate::Result<RunOutcome> {
        match run_pipeline(&self.input_text, &self.cluster_count, &self.config) {
            Ok(output) => {
                self.outputs = SessionOutputs {
                    centroid_text: output.centroid_text,
                    assignment_text: output.assignment_text,
                    plot: output.plot,
                    matrix: output.matrix,
                    model: Some(output.model),
                };
                debug!("session outputs replaced");
                Ok(RunOutcome::Completed)
            }
            Err(err) => match err.skipped_rows() {
                Some(rows) => {
                    debug!(rows, "run skipped, keeping previous outputs");
                    Ok(RunOutcome::Skipped { rows })
                }
                None => {
                    warn!(error = %err, "run rejected, keeping previous outputs");
                    Err(err)
                }
            },
        }
    }
}
