//! Command-line interface definitions and argument parsing

use crate::data::{parse_token, DEFAULT_SEPARATOR};
use crate::model::DEFAULT_MAX_ITER;
use crate::pipeline::PipelineConfig;
use crate::session::DEFAULT_CLUSTER_COUNT;
use clap::Parser;

/// Partition numeric vectors into k clusters with k-means++ seeded k-means
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input file with one vector per line, or "-" for stdin
    #[arg(short, long, default_value = "-")]
    pub input: String,

    /// Number of clusters
    #[arg(short = 'k', long, default_value = DEFAULT_CLUSTER_COUNT)]
    pub clusters: String,

    /// Maximum refinement passes for K-Means
    #[arg(long, default_value_t = DEFAULT_MAX_ITER)]
    pub max_iters: usize,

    /// Random seed for k-means++ seeding; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Field separator for input and output
    #[arg(short, long, default_value_t = DEFAULT_SEPARATOR)]
    pub separator: char,

    /// Write a scatter plot of 1-D or 2-D data (.png or .svg)
    #[arg(short, long)]
    pub plot: Option<String>,

    /// Predict the cluster of a vector, given in the input format
    /// Example: --predict "3.5,7"
    #[arg(long)]
    pub predict: Option<String>,

    /// Print cluster statistics after the run
    #[arg(long)]
    pub stats: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Pipeline settings taken from the arguments
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            separator: self.separator,
            max_iter: self.max_iters,
            seed: self.seed,
        }
    }

    /// Parse the vector given to `--predict`
    pub fn parse_predict_vector(&self) -> anyhow::Result<Option<Vec<f64>>> {
        let Some(ref predict_str) = self.predict else {
            return Ok(None);
        };

        let values = predict_str
            .split(self.separator)
            .map(|part| {
                parse_token(part)
                    .ok_or_else(|| anyhow::anyhow!("Invalid predict value: '{}'", part))
            })
            .collect::<anyhow::Result<Vec<f64>>>()?;

        Ok(Some(values))
    }

    /// Whether input comes from stdin
    pub fn reads_stdin(&self) -> bool {
        self.input == "-"
    }
}
