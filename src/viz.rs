//! Scatter rendering of projected clusters using Plotters

use crate::data::Matrix;
use crate::model::KMeansModel;
use crate::projection::{extend_bounds, PlotSeries};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use tracing::info;

/// Color palette for the first clusters; later clusters use `Palette99`
const CLUSTER_COLORS: [RGBColor; 5] = [RED, BLUE, GREEN, YELLOW, MAGENTA];

/// Appearance of a rendered scatter plot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotStyle {
    /// Caption above the chart
    pub title: Option<String>,
    /// Draw axis labels, tick labels and the series legend
    pub annotate: bool,
    /// Image size in pixels
    pub size: (u32, u32),
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            title: Some("k-means clusters".to_string()),
            annotate: true,
            size: (800, 600),
        }
    }
}

/// Color used for cluster `index`.
pub fn cluster_color(index: usize) -> RGBColor {
    CLUSTER_COLORS.get(index).copied().unwrap_or_else(|| {
        let rgba = Palette99::pick(index).to_rgba();
        RGBColor(rgba.0, rgba.1, rgba.2)
    })
}

/// Render a scatter plot of the clusters, centroids drawn as squares.
///
/// The backend follows the file extension: `.svg` writes SVG, anything else
/// a bitmap (PNG for `.png`).
pub fn render_scatter(
    plot: &PlotSeries,
    centroids: Option<&[(f64, f64)]>,
    output_path: impl AsRef<Path>,
    style: &PlotStyle,
) -> anyhow::Result<()> {
    let output_path = output_path.as_ref();
    let is_svg = output_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);

    if is_svg {
        let root = SVGBackend::new(output_path, style.size).into_drawing_area();
        draw_scatter(&root, plot, centroids, style)?;
        root.present()?;
    } else {
        let root = BitMapBackend::new(output_path, style.size).into_drawing_area();
        draw_scatter(&root, plot, centroids, style)?;
        root.present()?;
    }

    info!(path = %output_path.display(), clusters = plot.len(), "cluster plot saved");
    Ok(())
}

fn draw_scatter<DB>(
    root: &DrawingArea<DB, Shift>,
    plot: &PlotSeries,
    centroids: Option<&[(f64, f64)]>,
    style: &PlotStyle,
) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (x_min, x_max, y_min, y_max) = plot_bounds(plot, centroids.unwrap_or(&[]));

    root.fill(&WHITE)?;

    let mut builder = ChartBuilder::on(root);
    builder.margin(10);
    if let Some(title) = style.title.as_deref() {
        builder.caption(title, ("sans-serif", 30));
    }
    if style.annotate {
        builder.x_label_area_size(50).y_label_area_size(60);
    }
    let mut chart = builder.build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    if style.annotate {
        chart
            .configure_mesh()
            .x_desc("x")
            .y_desc("y")
            .axis_desc_style(("sans-serif", 15))
            .draw()?;
    }

    // Data points colored by cluster
    for (cluster_id, group) in plot.groups.iter().enumerate() {
        let color = cluster_color(cluster_id);
        let series = chart.draw_series(
            group
                .points
                .iter()
                .map(move |&(x, y)| Circle::new((x, y), 4, color.filled())),
        )?;
        if style.annotate {
            series
                .label(group.name.clone())
                .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
        }
    }

    // Centroids as larger squares
    if let Some(centroids) = centroids {
        let half_x = (x_max - x_min) * 0.01;
        let half_y = (y_max - y_min) * 0.01;
        for (cluster_id, &(cx, cy)) in centroids.iter().enumerate() {
            let color = cluster_color(cluster_id);
            chart.draw_series(std::iter::once(Rectangle::new(
                [(cx - half_x, cy - half_y), (cx + half_x, cy + half_y)],
                color.filled(),
            )))?;
        }
    }

    if style.annotate {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    Ok(())
}

/// Padded `(x_min, x_max, y_min, y_max)` covering every point and centroid.
fn plot_bounds(plot: &PlotSeries, centroids: &[(f64, f64)]) -> (f64, f64, f64, f64) {
    let (x_min, x_max, y_min, y_max) = centroids
        .iter()
        .copied()
        .fold(plot.bounds(), extend_bounds)
        .unwrap_or((0.0, 0.0, 0.0, 0.0));

    let (x_min, x_max) = pad_range(x_min, x_max);
    let (y_min, y_max) = pad_range(y_min, y_max);
    (x_min, x_max, y_min, y_max)
}

fn pad_range(min: f64, max: f64) -> (f64, f64) {
    let span = max - min;
    let pad = if span > 0.0 { span * 0.05 } else { 0.5 };
    (min - pad, max + pad)
}

/// Print cluster statistics to console
pub fn print_cluster_statistics(matrix: &Matrix, model: &KMeansModel) {
    let total = matrix.nrows().max(1);

    println!("\n=== Cluster Statistics ===");
    println!("Number of clusters: {}", model.n_clusters);
    println!("Total vectors: {}", matrix.nrows());
    println!(
        "Iterations: {} ({})",
        model.n_iterations,
        if model.converged { "converged" } else { "iteration cap reached" }
    );
    println!("Within-cluster sum of squares (Inertia): {:.4}", model.inertia);

    let silhouette_score = model.compute_silhouette_sample(matrix, 100);
    println!("Silhouette score (sample): {:.3}", silhouette_score);
    println!("Seed: {}", model.seed);

    println!("\nCluster sizes:");
    for (i, &size) in model.cluster_sizes().iter().enumerate() {
        let percentage = (size as f64 / total as f64) * 100.0;
        println!("  Cluster {}: {} vectors ({:.1}%)", i, size, percentage);
    }
}
