//! Minimum spanning tree construction over the mutual-reachability graph
//! (§4.4), using Prim's algorithm with an array-backed frontier.
//!
//! Prim's is preferred over Kruskal's here because the graph is dense
//! (complete): an array-backed frontier update is O(n) per step and O(n²)
//! overall, with O(n) auxiliary memory, matching §5's guidance to stream
//! edges from Prim's frontier rather than materialize the full O(n²) edge
//! set. Edges are produced already sorted ascending by weight with
//! deterministic ties, matching §4.4's observable ordering contract, so
//! downstream dendrogram construction (§4.5) needs no further sorting pass.

use tracing::instrument;

use crate::distance::DistanceError;
use crate::error::{ClusteringError, Result};
use crate::mutual_reachability::{mutual_reachability, Edge};

/// Builds a minimum spanning forest over the mutual-reachability graph using
/// Prim's algorithm, one connected component at a time.
///
/// `distance` computes the raw metric between two points; `core` supplies
/// each point's precomputed core distance (§4.2). Returns exactly `n - 1`
/// edges, sorted ascending by weight with the stable `(min(i, j), max(i,
/// j))` tie-break required by §4.4.
///
/// With a correctly-behaved distance capability every pair of points has a
/// finite mutual-reachability weight, so Prim's frontier always spans the
/// whole graph in one component; a forest with more than one component
/// surfaces as [`ClusteringError::DisconnectedGraph`].
///
/// # Errors
/// Returns [`ClusteringError::Distance`] if `distance` reports a NaN or
/// negative value for any pair, [`ClusteringError::DisconnectedGraph`] if
/// the resulting forest has more than one component, and
/// [`ClusteringError::EmptyPoints`] for an empty point set.
#[instrument(skip(points, core, distance), fields(n = points.len()))]
pub fn build_mst<D>(points: &[Vec<f32>], core: &[f32], distance: D) -> Result<Vec<Edge>>
where
    D: Fn(&[f32], &[f32]) -> core::result::Result<f32, DistanceError>,
{
    let n = points.len();
    if n == 0 {
        return Err(ClusteringError::EmptyPoints);
    }

    let mut in_tree = vec![false; n];
    // best_weight[v] / best_from[v]: cheapest known edge connecting v to the
    // growing tree, updated as new vertices join (the classic array-backed
    // Prim's frontier).
    let mut best_weight = vec![f32::INFINITY; n];
    let mut best_from = vec![0_usize; n];

    let mut edges = Vec::with_capacity(n.saturating_sub(1));
    let mut sequence = 0_u64;
    let mut components = 0_usize;

    // Process one connected component per outer iteration so disconnected
    // mutual-reachability graphs still yield a valid forest rather than
    // getting stuck on an unreachable frontier.
    for root in 0..n {
        if in_tree[root] {
            continue;
        }
        components += 1;
        best_weight[root] = 0.0;
        best_from[root] = root;

        loop {
            let mut next = None;
            for v in 0..n {
                if in_tree[v] {
                    continue;
                }
                if next.is_none_or(|current| {
                    best_weight[v] < best_weight[current]
                        || (best_weight[v] == best_weight[current] && v < current)
                }) {
                    next = Some(v);
                }
            }
            let Some(v) = next else { break };
            if !best_weight[v].is_finite() {
                // No edge connects v to the current tree; v starts a new
                // component in a later outer iteration.
                break;
            }
            in_tree[v] = true;
            if best_from[v] != v {
                edges.push(Edge::new(best_from[v], v, best_weight[v], sequence));
                sequence += 1;
            }

            for u in 0..n {
                if in_tree[u] {
                    continue;
                }
                let d = distance(&points[v], &points[u]).map_err(|source| {
                    ClusteringError::Distance {
                        left: v,
                        right: u,
                        source,
                    }
                })?;
                let d = crate::error::validate_distance_result(d, v, u)?;
                let weight = mutual_reachability(core[v], core[u], d);
                if weight < best_weight[u] {
                    best_weight[u] = weight;
                    best_from[u] = v;
                }
            }
        }
    }

    if components > 1 {
        return Err(ClusteringError::DisconnectedGraph {
            connected: edges.len(),
            expected: n - 1,
        });
    }

    edges.sort_unstable();
    Ok(edges)
}
