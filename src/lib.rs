//! Density-based hierarchical clustering (the HDBSCAN family).
//!
//! Given a finite set of points and a minimum cluster size, [`Clustering`]
//! computes the mutual-reachability graph and its minimum spanning tree,
//! collapses the tree into a condensed dendrogram, selects an optimal flat
//! clustering by a stability/score criterion, and optionally post-processes
//! the result into centroids, outliers, and a Voronoi fill.
//!
//! Distance and cluster-score functions are pluggable capabilities supplied
//! by the caller (see [`capability`]); the engine itself is single-threaded
//! and synchronous, ships no I/O, and has no wire protocol.

mod capability;
mod clustering;
mod core_distance;
mod dendrogram;
mod distance;
mod error;
mod memory;
mod mst;
mod mutual_reachability;
mod postprocess;
mod quality;
mod result;
mod scoring;
mod selection;

pub use crate::capability::{euclidean, variance, variance_score};
pub use crate::clustering::{Clustering, ProgressSink};
pub use crate::core_distance::core_distances;
pub use crate::dendrogram::{Dendrogram, Link, LinkId, Member};
pub use crate::distance::{
    CosineNorms, Distance, DistanceError, Norm, Result as DistanceResult, VectorKind,
    cosine_distance, euclidean_distance,
};
pub use crate::error::{ClusteringError, ClusteringErrorCode, Result};
pub use crate::memory::{estimate_peak_bytes, format_bytes};
pub use crate::mst::build_mst;
pub use crate::mutual_reachability::{Edge, all_edges_sorted, mutual_reachability};
pub use crate::quality::{
    ClusteringQualityError, ClusteringQualityScore, adjusted_rand_index, clustering_quality_score,
    normalized_mutual_information,
};
pub use crate::result::{Cluster, Outlier};
pub use crate::scoring::{persistence, score_candidate};
pub use crate::selection::select_clusters;

#[cfg(test)]
pub(crate) mod test_utils;
