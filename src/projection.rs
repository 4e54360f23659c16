//! Result projection: centroids and assignments back to text, plus the
//! plot-ready grouping of rows by cluster for 1-D and 2-D data

use crate::data::Matrix;
use ndarray::{Array2, ArrayView1};

/// Points of one cluster, ready for a 2-D scatter renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterPoints {
    /// Display name, `"Cluster {index}"`
    pub name: String,
    /// `(x, y)` per member row, in row order; `y` is 0 for 1-D data
    pub points: Vec<(f64, f64)>,
}

/// One group of points per cluster, in cluster order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlotSeries {
    pub groups: Vec<ClusterPoints>,
}

impl PlotSeries {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// All points across every group.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.groups.iter().flat_map(|group| group.points.iter().copied())
    }

    /// `(x_min, x_max, y_min, y_max)` over all points, `None` when there are none.
    pub fn bounds(&self) -> Option<Bounds> {
        self.points().fold(None, extend_bounds)
    }
}

/// `(x_min, x_max, y_min, y_max)` of a set of points.
pub type Bounds = (f64, f64, f64, f64);

/// Grow `bounds` to cover `(x, y)`.
pub fn extend_bounds(bounds: Option<Bounds>, (x, y): (f64, f64)) -> Option<Bounds> {
    match bounds {
        None => Some((x, x, y, y)),
        Some((x0, x1, y0, y1)) => Some((x0.min(x), x1.max(x), y0.min(y), y1.max(y))),
    }
}

/// Serialize centroids one per line, features joined by `separator`.
///
/// Numbers use the shortest representation that parses back to the same
/// `f64`, so parsing the output reproduces the centroids exactly.
pub fn serialize_centroids(centroids: &Array2<f64>, separator: char) -> String {
    serialize_rows(centroids.outer_iter().map(|row| row.to_vec()), separator)
}

fn serialize_rows(rows: impl Iterator<Item = Vec<f64>>, separator: char) -> String {
    let sep = separator.to_string();
    rows.map(|row| {
        row.iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(&sep)
    })
    .collect::<Vec<_>>()
    .join("\n")
}

/// Serialize assignments one cluster index per line, in row order.
pub fn serialize_assignments(labels: &[usize]) -> String {
    labels
        .iter()
        .map(|label| label.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Group rows by assigned cluster as 2-D points.
///
/// Returns `None` unless the matrix is non-empty with dimensionality 1 or 2
/// and `labels` has one entry per row. Labels outside `0..k` are dropped.
pub fn project(matrix: &Matrix, labels: &[usize], k: usize) -> Option<PlotSeries> {
    if matrix.is_empty() || !matches!(matrix.dim(), 1 | 2) || labels.len() != matrix.nrows() {
        return None;
    }

    let mut groups: Vec<ClusterPoints> = (0..k)
        .map(|cluster| ClusterPoints {
            name: format!("Cluster {}", cluster),
            points: Vec::new(),
        })
        .collect();

    for (row, &label) in matrix.rows().zip(labels) {
        if let Some(group) = groups.get_mut(label) {
            group.points.push(point_of(&row));
        }
    }

    Some(PlotSeries { groups })
}

/// Project centroids onto the same plane as [`project`] (1-D or 2-D only).
pub fn project_centroids(centroids: &Array2<f64>) -> Option<Vec<(f64, f64)>> {
    if centroids.nrows() == 0 || !matches!(centroids.ncols(), 1 | 2) {
        return None;
    }
    Some(
        centroids
            .outer_iter()
            .map(|row| point_of(&row))
            .collect(),
    )
}

fn point_of(features: &ArrayView1<'_, f64>) -> (f64, f64) {
    (
        features.get(0).copied().unwrap_or(0.0),
        features.get(1).copied().unwrap_or(0.0),
    )
}
