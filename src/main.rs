//! clusterpad: k-means clustering of pasted numeric vectors
//!
//! Reads vectors as text, runs the clustering session, prints centroids and
//! assignments, and optionally renders a scatter plot and a prediction.

use anyhow::{Context, Result};
use clap::Parser;
use clusterpad::projection::project_centroids;
use clusterpad::viz::{self, PlotStyle};
use clusterpad::{Args, RunOutcome, Session};
use std::io::Read;
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_logging(args.verbose);

    let start_time = Instant::now();
    let text = read_input(&args)?;

    let mut session = Session::new(args.pipeline_config());
    session.set_input_text(text);
    session.set_cluster_count(args.clusters.clone());

    match session.run()? {
        RunOutcome::Skipped { rows } => {
            eprintln!("Not enough data to cluster ({} row(s)); nothing to do.", rows);
            return Ok(());
        }
        RunOutcome::Completed => {}
    }

    let outputs = session.outputs();
    println!("=== Centroids ===");
    println!("{}", outputs.centroid_text);
    println!("\n=== Assignments ===");
    println!("{}", outputs.assignment_text);

    let Some(model) = outputs.model.as_ref() else {
        return Ok(());
    };

    if args.stats {
        viz::print_cluster_statistics(&outputs.matrix, model);
    }

    if let Some(vector) = args.parse_predict_vector()? {
        let cluster = model.predict(&vector)?;
        println!("\nPredicted cluster: {}", cluster);
    }

    if let Some(plot_path) = args.plot.as_deref() {
        match outputs.plot.as_ref() {
            Some(plot) => {
                let centroids = project_centroids(&model.centroids);
                viz::render_scatter(plot, centroids.as_deref(), plot_path, &PlotStyle::default())
                    .with_context(|| format!("failed to render plot to {}", plot_path))?;
                println!("\nPlot saved to: {}", plot_path);
            }
            None => eprintln!(
                "No plot: scatter output needs 1-D or 2-D vectors, got {}-D.",
                model.dim()
            ),
        }
    }

    if args.verbose {
        eprintln!(
            "Total processing time: {:.3}s",
            start_time.elapsed().as_secs_f64()
        );
    }

    Ok(())
}

/// Install the tracing subscriber; `RUST_LOG` wins unless `--verbose` is set
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Read the raw input text from a file or stdin
fn read_input(args: &Args) -> Result<String> {
    if args.reads_stdin() {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read vectors from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(&args.input)
            .with_context(|| format!("failed to read input file {}", args.input))
    }
}
