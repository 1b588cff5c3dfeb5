//! Functional clustering quality tests.
//!
//! Runs the full pipeline over small synthetic datasets with known ground
//! truth and checks the recovered partition against it using ARI/NMI (§8).

use anyhow::{Context, Result};
use talus::{Clustering, clustering_quality_score, euclidean, variance_score};

type TestResult<T = ()> = Result<T>;

/// Builds `count` points laid out on a small grid around `center`, so that
/// points within a blob are close together and distinct blobs are far apart.
fn blob(center: &[f32], count: usize) -> Vec<Vec<f32>> {
    (0..count)
        .map(|i| {
            center
                .iter()
                .enumerate()
                .map(|(dim, &value)| {
                    let jitter = ((i + dim) % 3) as f32 * 0.05;
                    value + jitter
                })
                .collect()
        })
        .collect()
}

/// Predicted label per point, derived from a completed clustering: the
/// cluster id a point belongs to (as a member or an outlier), or `usize::MAX`
/// if unassigned.
fn predicted_labels(n: usize, clustering: &Clustering) -> Vec<usize> {
    let mut labels = vec![usize::MAX; n];
    for cluster in clustering.clusters() {
        for &point in cluster.points() {
            labels[point] = cluster.id();
        }
        for outlier in cluster.outliers() {
            labels[outlier.index()] = cluster.id();
        }
    }
    labels
}

#[test]
fn three_well_separated_blobs_recover_near_perfect_partition() -> TestResult {
    let mut points = blob(&[0.0, 0.0], 6);
    points.extend(blob(&[50.0, 0.0], 6));
    points.extend(blob(&[0.0, 50.0], 6));

    let ground_truth: Vec<usize> = (0..18).map(|i| i / 6).collect();

    let mut clustering = Clustering::new(points, 3).context("valid configuration")?;
    clustering
        .run(euclidean, variance_score, true)
        .context("run must succeed on well-separated blobs")?;

    assert_eq!(clustering.clusters().len(), 3);

    let predicted = predicted_labels(18, &clustering);
    assert!(
        predicted.iter().all(|&label| label != usize::MAX),
        "every point should land in some cluster with no outlier options enabled"
    );

    let score = clustering_quality_score(&ground_truth, &predicted)
        .context("quality score must be computable")?;
    assert!(score.ari > 0.9, "expected near-perfect ARI, got {}", score.ari);
    assert!(score.nmi > 0.9, "expected near-perfect NMI, got {}", score.nmi);
    Ok(())
}

#[test]
fn outlier_detection_isolates_a_distant_point() -> TestResult {
    let mut points = blob(&[0.0, 0.0], 6);
    points.extend(blob(&[50.0, 0.0], 6));
    points.push(vec![200.0, 200.0]);

    let mut clustering = Clustering::new(points, 3)
        .context("valid configuration")?
        .outlier_detection();
    clustering
        .run(euclidean, variance_score, true)
        .context("run must succeed")?;

    let outlier_index = 12;
    let is_outlier = clustering
        .clusters()
        .iter()
        .any(|cluster| cluster.outliers().iter().any(|o| o.index() == outlier_index));
    assert!(is_outlier, "the far point should be attributed as an outlier");

    let as_member = clustering
        .clusters()
        .iter()
        .any(|cluster| cluster.points().contains(&outlier_index));
    assert!(!as_member, "an outlier must not also be a full member");
    Ok(())
}

#[test]
fn subsample_and_assign_recovers_a_consistent_partition() -> TestResult {
    let mut points = blob(&[0.0, 0.0], 10);
    points.extend(blob(&[50.0, 0.0], 10));

    let mut model = Clustering::new(points.clone(), 3)
        .context("valid configuration")?
        .subsample(16)
        .context("subsample must fit within the dataset")?;
    model
        .run(euclidean, variance_score, true)
        .context("training run must succeed")?;

    let assigned = model
        .assign(&points, euclidean)
        .context("assign must succeed once the model has run")?;

    let ground_truth: Vec<usize> = (0..20).map(|i| i / 10).collect();
    let predicted = predicted_labels(20, &assigned);

    let score = clustering_quality_score(&ground_truth, &predicted)
        .context("quality score must be computable")?;
    assert!(score.ari > 0.8, "expected strong ARI after assign, got {}", score.ari);
    Ok(())
}
