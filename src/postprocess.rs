//! Post-processors (§4.8), applied in fixed order after candidate selection:
//! centroids, outlier attribution, outlier clustering, and Voronoi fill.

use tracing::{debug, instrument};

use crate::distance::DistanceError;
use crate::error::{ClusteringError, Result};
use crate::result::{Cluster, Outlier};

/// Computes the arithmetic mean vector for every cluster's member points
/// (§4.8 step 1).
#[instrument(skip(clusters, points), fields(clusters = clusters.len()))]
pub fn compute_centroids(clusters: &mut [Cluster], points: &[Vec<f32>]) {
    for cluster in clusters {
        cluster.set_centroid(centroid_of(cluster.points(), points));
        cluster.set_variance(crate::capability::variance(cluster.points(), points));
    }
}

fn centroid_of(members: &[usize], points: &[Vec<f32>]) -> Vec<f32> {
    let Some(&first) = members.first() else {
        return Vec::new();
    };
    let dimension = points[first].len();
    let mut sum = vec![0.0_f64; dimension];
    for &index in members {
        for (slot, value) in sum.iter_mut().zip(points[index].iter()) {
            *slot += f64::from(*value);
        }
    }
    let count = members.len() as f64;
    sum.into_iter().map(|total| (total / count) as f32).collect()
}

/// Returns every point index in `0..n` that is not a member or outlier of
/// any cluster, in ascending order.
#[must_use]
pub fn unassigned_points(n: usize, clusters: &[Cluster]) -> Vec<usize> {
    (0..n)
        .filter(|&index| {
            !clusters
                .iter()
                .any(|cluster| cluster.contains_point(index) || cluster.contains_outlier(index))
        })
        .collect()
}

/// Nearness of `point` to `cluster`: distance to the centroid by default, or
/// the minimum distance to any member point when `nearest_neighbor` is set
/// (§4.8 step 2).
///
/// `point_index` is used only to attribute a distance-capability failure to
/// a concrete pair; when comparing against the centroid (which has no point
/// index of its own) the same index is reported on both sides of the error.
fn nearness<D>(
    point_index: usize,
    point: &[f32],
    cluster: &Cluster,
    points: &[Vec<f32>],
    nearest_neighbor: bool,
    distance: &D,
) -> Result<f32>
where
    D: Fn(&[f32], &[f32]) -> core::result::Result<f32, DistanceError>,
{
    if nearest_neighbor {
        let mut best = f32::INFINITY;
        for &member in cluster.points() {
            let d = distance(point, &points[member]).map_err(|source| ClusteringError::Distance {
                left: point_index,
                right: member,
                source,
            })?;
            let d = crate::error::validate_distance_result(d, point_index, member)?;
            best = best.min(d);
        }
        Ok(best)
    } else {
        let d = distance(point, cluster.centroid()).map_err(|source| ClusteringError::Distance {
            left: point_index,
            right: point_index,
            source,
        })?;
        crate::error::validate_distance_result(d, point_index, point_index)
    }
}

fn nearest_cluster<D>(
    point_index: usize,
    point: &[f32],
    clusters: &[Cluster],
    points: &[Vec<f32>],
    nearest_neighbor: bool,
    distance: &D,
) -> Result<Option<(usize, f32)>>
where
    D: Fn(&[f32], &[f32]) -> core::result::Result<f32, DistanceError>,
{
    let mut best: Option<(usize, f32)> = None;
    for (slot, cluster) in clusters.iter().enumerate() {
        let d = nearness(point_index, point, cluster, points, nearest_neighbor, distance)?;
        if best.is_none_or(|(_, current)| d < current) {
            best = Some((slot, d));
        }
    }
    Ok(best)
}

/// Attaches every point in `unassigned` to its nearest cluster as an
/// outlier, then normalizes each cluster's recorded distances against the
/// minimum/maximum observed among that cluster's own outliers (§4.8 step 2).
///
/// # Errors
/// Propagates [`ClusteringError::Distance`] if `distance` misbehaves.
#[instrument(skip(clusters, points, unassigned, distance), fields(unassigned = unassigned.len()))]
pub fn attach_outliers<D>(
    clusters: &mut [Cluster],
    points: &[Vec<f32>],
    unassigned: &[usize],
    nearest_neighbor: bool,
    distance: &D,
) -> Result<()>
where
    D: Fn(&[f32], &[f32]) -> core::result::Result<f32, DistanceError>,
{
    if clusters.is_empty() {
        return Ok(());
    }

    let mut raw: Vec<Vec<(usize, f32)>> = vec![Vec::new(); clusters.len()];
    for &index in unassigned {
        let Some((slot, d)) =
            nearest_cluster(index, &points[index], clusters, points, nearest_neighbor, distance)?
        else {
            continue;
        };
        raw[slot].push((index, d));
    }

    for (cluster, distances) in clusters.iter_mut().zip(raw.into_iter()) {
        if distances.is_empty() {
            continue;
        }
        let max = distances
            .iter()
            .map(|(_, d)| *d)
            .fold(f32::MIN, f32::max);
        for (index, d) in distances {
            let normalized = if max > 0.0 { d / max } else { 1.0 };
            cluster.push_outlier(Outlier::new(index, normalized));
        }
    }
    debug!("outlier attribution complete");
    Ok(())
}

/// Promotes any cluster's outlier set to a standalone cluster once it grows
/// to at least `min_cluster_size` (§4.8 step 3). Returns the newly minted
/// clusters; `next_id` is the first identifier to assign them.
#[instrument(skip(clusters, points), fields(clusters = clusters.len(), min_cluster_size))]
pub fn promote_outlier_clusters(
    clusters: &mut [Cluster],
    points: &[Vec<f32>],
    min_cluster_size: usize,
    next_id: usize,
) -> Vec<Cluster> {
    let mut promoted = Vec::new();
    let mut id = next_id;
    for cluster in clusters {
        if cluster.outliers().len() < min_cluster_size {
            continue;
        }
        let outliers = cluster.take_outliers();
        let member_points: Vec<usize> = outliers.iter().map(Outlier::index).collect();
        let mut promoted_cluster = Cluster::new(id, member_points, 0.0);
        promoted_cluster.set_centroid(centroid_of(promoted_cluster.points(), points));
        promoted_cluster.set_variance(crate::capability::variance(
            promoted_cluster.points(),
            points,
        ));
        id += 1;
        promoted.push(promoted_cluster);
    }
    promoted
}

/// Appends every still-unassigned point to the `points` of its nearest
/// cluster (§4.8 step 4). No normalized distance is recorded.
///
/// # Errors
/// Propagates [`ClusteringError::Distance`] if `distance` misbehaves.
#[instrument(skip(clusters, points, unassigned, distance), fields(unassigned = unassigned.len()))]
pub fn voronoi_fill<D>(
    clusters: &mut [Cluster],
    points: &[Vec<f32>],
    unassigned: &[usize],
    nearest_neighbor: bool,
    distance: &D,
) -> Result<()>
where
    D: Fn(&[f32], &[f32]) -> core::result::Result<f32, DistanceError>,
{
    if clusters.is_empty() {
        return Ok(());
    }
    for &index in unassigned {
        let Some((slot, _)) =
            nearest_cluster(index, &points[index], clusters, points, nearest_neighbor, distance)?
        else {
            continue;
        };
        clusters[slot].push_point(index);
    }
    Ok(())
}
