//! Error types for the clustering pipeline

use thiserror::Error;

/// Errors surfaced to the caller of the pipeline.
///
/// Malformed numbers and ragged rows never show up here: ingestion recovers
/// from both with fixed fallbacks (see [`crate::data::parse_matrix`]).
/// Empty clusters during refinement are reseeded inside the engine.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Fewer than two rows; clustering is skipped.
    #[error("insufficient data: clustering needs at least 2 rows, got {rows}")]
    InsufficientData { rows: usize },

    /// Cluster count outside `1..=rows`.
    #[error("invalid cluster count: cannot create {requested} clusters from {rows} rows")]
    InvalidClusterCount { requested: i64, rows: usize },

    /// Cluster count text is not a base-10 integer.
    #[error("invalid cluster count: '{0}' is not a base-10 integer")]
    MalformedClusterCount(String),

    /// A vector's width does not match the fitted dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

impl ClusterError {
    /// Row count of a run that was skipped rather than rejected; `None` for
    /// every real failure.
    pub fn skipped_rows(&self) -> Option<usize> {
        match self {
            ClusterError::InsufficientData { rows } => Some(*rows),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ClusterError::InvalidClusterCount {
            requested: 0,
            rows: 4,
        };
        assert_eq!(
            err.to_string(),
            "invalid cluster count: cannot create 0 clusters from 4 rows"
        );

        let err = ClusterError::MalformedClusterCount("abc".to_string());
        assert!(err.to_string().contains("'abc'"));
    }

    #[test]
    fn test_skipped_rows() {
        assert_eq!(ClusterError::InsufficientData { rows: 1 }.skipped_rows(), Some(1));
        assert_eq!(
            ClusterError::MalformedClusterCount(String::new()).skipped_rows(),
            None
        );
    }
}
