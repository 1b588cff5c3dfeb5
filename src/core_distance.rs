//! Per-point core distances (§4.2): the distance from each point to its
//! `min_cluster_size`-th nearest neighbor.

use tracing::instrument;

use crate::distance::DistanceError;
use crate::error::{ClusteringError, Result};

/// Computes the core distance of every point against every other point in
/// `points`, using `distance` as the underlying metric.
///
/// Core distance of point `i` is the distance to its `k`-th nearest neighbor
/// (`k = min_cluster_size`), computed by scanning all `n - 1` other points and
/// selecting the `k`-th smallest distance; ties are broken by neighbor index
/// so the result is deterministic regardless of scan order.
///
/// The O(n) per-point neighbor scans are independent and are farmed out with
/// Rayon when the `rayon` feature is enabled; the sequential fallback visits
/// points in index order. Either way each point's own k-nearest selection is
/// a deterministic sort, so results are identical across both code paths.
///
/// `distance` is a pure capability (§4.1): it reports [`DistanceError`]
/// without knowing which pair it was called for, so this function attaches
/// the offending indices when wrapping the failure into
/// [`ClusteringError::Distance`].
///
/// # Errors
/// Returns [`ClusteringError::Distance`] if `distance` reports a NaN or
/// negative value for any pair.
#[instrument(skip(points, distance), fields(n = points.len(), k = min_cluster_size))]
pub fn core_distances<D>(
    points: &[Vec<f32>],
    min_cluster_size: usize,
    distance: D,
) -> Result<Vec<f32>>
where
    D: Fn(&[f32], &[f32]) -> core::result::Result<f32, DistanceError> + Sync,
{
    let n = points.len();
    let compute_one = |i: usize| -> Result<f32> {
        let mut neighbor_distances: Vec<(f32, usize)> = Vec::with_capacity(n.saturating_sub(1));
        for j in 0..n {
            if i == j {
                continue;
            }
            let d = distance(&points[i], &points[j]).map_err(|source| ClusteringError::Distance {
                left: i,
                right: j,
                source,
            })?;
            let d = crate::error::validate_distance_result(d, i, j)?;
            neighbor_distances.push((d, j));
        }
        neighbor_distances
            .sort_unstable_by(|left, right| left.0.total_cmp(&right.0).then(left.1.cmp(&right.1)));
        let kth = min_cluster_size.saturating_sub(1);
        neighbor_distances
            .get(kth)
            .map(|(d, _)| *d)
            .ok_or(ClusteringError::InsufficientPoints {
                points: n,
                required: min_cluster_size,
            })
    };

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        (0..n).into_par_iter().map(compute_one).collect()
    }

    #[cfg(not(feature = "rayon"))]
    {
        (0..n).map(compute_one).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn line(values: &[f32]) -> Vec<Vec<f32>> {
        values.iter().map(|v| vec![*v]).collect()
    }

    fn abs_distance(left: &[f32], right: &[f32]) -> core::result::Result<f32, DistanceError> {
        Ok((left[0] - right[0]).abs())
    }

    #[rstest]
    fn returns_kth_nearest_distance_for_each_point() {
        let points = line(&[0.0, 1.0, 2.0, 10.0]);
        let result = core_distances(&points, 2, abs_distance).expect("enough points");
        // point 0: neighbors at 1,2,10 -> sorted [1,2,9]; 2nd nearest (k=2) -> 2.0
        assert!((result[0] - 2.0).abs() < 1e-6);
        // point 1: distances to 0,2,10 -> [1,1,9]; 2nd nearest -> 1.0
        assert!((result[1] - 1.0).abs() < 1e-6);
    }

    #[rstest]
    fn rejects_fewer_points_than_min_cluster_size() {
        let points = line(&[0.0, 1.0]);
        let err = core_distances(&points, 3, abs_distance).expect_err("too few points");
        assert!(matches!(
            err,
            ClusteringError::InsufficientPoints {
                points: 2,
                required: 3
            }
        ));
    }

    #[rstest]
    fn ties_break_by_index_deterministically() {
        let points = line(&[0.0, 1.0, -1.0, 1.0]);
        let first = core_distances(&points, 1, abs_distance).expect("ok");
        let second = core_distances(&points, 1, abs_distance).expect("ok");
        assert_eq!(first, second);
    }
}
