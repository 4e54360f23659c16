//! Integration tests for clusterpad

use clusterpad::projection::project_centroids;
use clusterpad::viz::PlotStyle;
use clusterpad::{
    fit_kmeans, load_matrix, parse_matrix, render_scatter, run_pipeline, serialize_centroids,
    ClusterError, KMeansParams, PipelineConfig, RunOutcome, Session,
};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

/// Three well separated 2-D blobs, 5 points each
fn create_test_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for (cx, cy) in [(0.0, 0.0), (20.0, 0.0), (10.0, 20.0)] {
        for (dx, dy) in [(0.0, 0.0), (0.5, 0.0), (0.0, 0.5), (-0.5, 0.0), (0.0, -0.5)] {
            writeln!(file, "{},{}", cx + dx, cy + dy).unwrap();
        }
    }
    file
}

fn seeded(seed: u64) -> PipelineConfig {
    PipelineConfig {
        seed: Some(seed),
        ..PipelineConfig::default()
    }
}

#[test]
fn test_end_to_end_pipeline() {
    let test_file = create_test_csv();
    let matrix = load_matrix(test_file.path(), ',').unwrap();
    assert_eq!(matrix.nrows(), 15);
    assert_eq!(matrix.dim(), 2);

    let model = fit_kmeans(&matrix, &KMeansParams::new(3).with_seed(2024)).unwrap();

    assert_eq!(model.n_clusters, 3);
    assert_eq!(model.labels.len(), 15);
    assert_eq!(model.centroids.shape(), &[3, 2]);
    assert!(model.labels.iter().all(|&label| label < 3));

    // Each blob lands in its own cluster
    for blob in 0..3 {
        let first = model.labels[blob * 5];
        assert!((0..5).all(|i| model.labels[blob * 5 + i] == first));
    }
    assert_eq!(model.cluster_sizes(), vec![5, 5, 5]);

    // Centroids sit on the blob centres
    let mut centres: Vec<(f64, f64)> = model
        .centroids
        .outer_iter()
        .map(|row| (row[0], row[1]))
        .collect();
    centres.sort_by(|a, b| a.0.total_cmp(&b.0));
    for ((x, y), (ex, ey)) in centres.iter().zip([(0.0, 0.0), (10.0, 20.0), (20.0, 0.0)]) {
        assert!((x - ex).abs() < 1e-9 && (y - ey).abs() < 1e-9);
    }
}

#[test]
fn test_scenario_duplicate_pairs() {
    let output = run_pipeline("0,0\n0,0\n10,10\n10,10", "2", &seeded(1)).unwrap();
    let labels = output.model.labels.to_vec();

    assert_eq!(labels[0], labels[1]);
    assert_eq!(labels[2], labels[3]);
    assert_ne!(labels[0], labels[2]);
    assert_eq!(output.model.centroids.row(labels[0]).to_vec(), vec![0.0, 0.0]);
    assert_eq!(output.model.centroids.row(labels[2]).to_vec(), vec![10.0, 10.0]);
}

#[test]
fn test_scenario_one_dimensional() {
    let output = run_pipeline("1\n2\n3\n100\n101\n102", "2", &seeded(9)).unwrap();

    let mut centroids: Vec<f64> = output
        .centroid_text
        .lines()
        .map(|line| line.parse().unwrap())
        .collect();
    centroids.sort_by(f64::total_cmp);
    assert_eq!(centroids, vec![2.0, 101.0]);

    let plot = output.plot.unwrap();
    assert!(plot.points().all(|(_, y)| y == 0.0));
    assert_eq!(plot.points().count(), 6);
}

#[test]
fn test_scenario_malformed_token() {
    let matrix = parse_matrix("1,x\n2,3", ',');
    assert_eq!(matrix.to_rows(), vec![vec![1.0, 0.0], vec![2.0, 3.0]]);
}

#[test]
fn test_scenario_non_positive_cluster_count() {
    for k in ["0", "-3"] {
        let result = run_pipeline("1,1\n2,2\n3,3", k, &seeded(1));
        assert!(matches!(
            result,
            Err(ClusterError::InvalidClusterCount { .. })
        ));
    }
}

#[test]
fn test_centroid_text_round_trip() {
    let test_file = create_test_csv();
    let matrix = load_matrix(test_file.path(), ',').unwrap();
    let model = fit_kmeans(&matrix, &KMeansParams::new(4).with_seed(5)).unwrap();

    let text = serialize_centroids(&model.centroids, ',');
    assert_eq!(parse_matrix(&text, ',').into_array(), model.centroids);
}

#[test]
fn test_session_lifecycle() {
    let mut session = Session::new(seeded(11));
    assert_eq!(session.run().unwrap(), RunOutcome::Skipped { rows: 0 });

    session.set_input_text("1,1\n1,2\n8,8\n9,8\n1,1.5");
    session.set_cluster_count("2");
    assert_eq!(session.run().unwrap(), RunOutcome::Completed);
    let first = session.outputs().clone();

    session.set_cluster_count("nope");
    assert!(session.run().is_err());
    assert_eq!(session.outputs().centroid_text, first.centroid_text);
    assert_eq!(session.outputs().assignment_text, first.assignment_text);
    assert_eq!(session.outputs().plot, first.plot);
}

#[test]
fn test_plot_file_from_pipeline() {
    let output = run_pipeline("0,0\n0,1\n1,0\n9,9\n9,10\n10,9", "2", &seeded(3)).unwrap();
    let plot = output.plot.expect("2-D data is plottable");
    let centroids = project_centroids(&output.model.centroids).unwrap();

    let temp_dir = tempdir().unwrap();
    let output_path = temp_dir.path().join("pipeline.svg");
    let style = PlotStyle {
        title: None,
        annotate: false,
        ..PlotStyle::default()
    };

    render_scatter(&plot, Some(&centroids), &output_path, &style).unwrap();
    assert!(output_path.exists());
}

#[test]
fn test_prediction() {
    let test_file = create_test_csv();
    let matrix = load_matrix(test_file.path(), ',').unwrap();
    let model = fit_kmeans(&matrix, &KMeansParams::new(3).with_seed(8)).unwrap();

    assert_eq!(model.predict(&[19.0, 1.0]).unwrap(), model.labels[5]);
    assert_eq!(model.predict(&[10.0, 18.0]).unwrap(), model.labels[10]);
}

#[test]
fn test_model_inertia() {
    let test_file = create_test_csv();
    let matrix = load_matrix(test_file.path(), ',').unwrap();
    let model = fit_kmeans(&matrix, &KMeansParams::new(3).with_seed(13)).unwrap();

    // Each blob: 4 points at distance 0.5 from the centre
    assert!((model.inertia - 3.0).abs() < 1e-9);
    assert!(model.converged);
}
