//! The driver (§4.10): composes core distances, the mutual-reachability
//! graph, the MST, the dendrogram, candidate selection, and the §4.8
//! post-processors under a single chainable configuration record.

use std::num::NonZeroUsize;

use rand::RngCore;
use rand::seq::index::sample as sample_indices;
use tracing::{debug, instrument, warn};

use crate::dendrogram::{self, Dendrogram};
use crate::distance::DistanceError;
use crate::error::{ClusteringError, Result};
use crate::mst::build_mst;
use crate::mutual_reachability::all_edges_sorted;
use crate::postprocess;
use crate::result::Cluster;
use crate::selection::select_clusters;

/// A caller-supplied progress sink for `Verbose` mode (§5): best-effort,
/// coarse-grained stage notifications layered on top of the `tracing` spans
/// each stage carries regardless of whether a sink is attached.
pub type ProgressSink = Box<dyn FnMut(&str)>;

#[derive(Default)]
struct Options {
    voronoi: bool,
    outlier_detection: bool,
    nearest_neighbor: bool,
    outlier_clustering: bool,
    subsample: Option<Vec<usize>>,
    verbose: Option<ProgressSink>,
}

impl Options {
    fn notify(&mut self, stage: &str) {
        if let Some(sink) = self.verbose.as_mut() {
            sink(stage);
        }
    }
}

struct RunOutputs {
    clusters: Vec<Cluster>,
    /// Maps a training-local point index (as produced by the dendrogram,
    /// which is always built over `0..n_train`) back to the index of that
    /// point in `Clustering::points`. Identity when not subsampled.
    training_indices: Vec<usize>,
}

enum State {
    NotRun,
    Run(RunOutputs),
}

/// The top-level clustering record (§3): owns the point data, configuration,
/// and (once run) the final output clusters.
///
/// Constructed once via [`Clustering::new`], configured by chainable option
/// mutators, executed via a single [`Clustering::run`], then read-only.
pub struct Clustering {
    points: Vec<Vec<f32>>,
    min_cluster_size: NonZeroUsize,
    options: Options,
    state: State,
}

impl Clustering {
    /// Validates `points` and `min_cluster_size` and constructs a clustering
    /// ready for option configuration (§6).
    ///
    /// # Errors
    /// Returns [`ClusteringError::EmptyPoints`] for an empty point set,
    /// [`ClusteringError::DimensionMismatch`] if points do not share a
    /// common, positive dimension, [`ClusteringError::InvalidMinClusterSize`]
    /// if `min_cluster_size < 2`, and [`ClusteringError::InsufficientPoints`]
    /// if fewer than `2 * min_cluster_size` points are supplied.
    #[instrument(skip(points), fields(n = points.len(), min_cluster_size))]
    pub fn new(points: Vec<Vec<f32>>, min_cluster_size: usize) -> Result<Self> {
        let Some(&first) = points.first() else {
            return Err(ClusteringError::EmptyPoints);
        };
        let dimension = first.len();
        if dimension == 0 {
            return Err(ClusteringError::DimensionMismatch {
                index: 0,
                found: 0,
                expected: 0,
            });
        }
        for (index, point) in points.iter().enumerate() {
            if point.len() != dimension {
                return Err(ClusteringError::DimensionMismatch {
                    index,
                    found: point.len(),
                    expected: dimension,
                });
            }
        }
        if min_cluster_size < 2 {
            return Err(ClusteringError::InvalidMinClusterSize {
                got: min_cluster_size,
            });
        }
        let required = min_cluster_size.saturating_mul(2);
        if points.len() < required {
            return Err(ClusteringError::InsufficientPoints {
                points: points.len(),
                required,
            });
        }

        // `min_cluster_size >= 2` was just checked above, so this is always `Some`.
        let min_cluster_size = NonZeroUsize::new(min_cluster_size).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            points,
            min_cluster_size,
            options: Options::default(),
            state: State::NotRun,
        })
    }

    /// Enables best-effort progress notifications to `sink` (§5, §6).
    #[must_use]
    pub fn verbose(mut self, sink: impl FnMut(&str) + 'static) -> Self {
        self.options.verbose = Some(Box::new(sink));
        self
    }

    /// Enables Voronoi fill (§4.8 step 4).
    #[must_use]
    pub fn voronoi(mut self) -> Self {
        self.options.voronoi = true;
        self
    }

    /// Enables outlier attribution (§4.8 step 2).
    #[must_use]
    pub fn outlier_detection(mut self) -> Self {
        self.options.outlier_detection = true;
        self
    }

    /// Switches the nearness metric from centroid distance to nearest-member
    /// distance (§4.8).
    #[must_use]
    pub fn nearest_neighbor(mut self) -> Self {
        self.options.nearest_neighbor = true;
        self
    }

    /// Enables outlier clustering (§4.8 step 3).
    #[must_use]
    pub fn outlier_clustering(mut self) -> Self {
        self.options.outlier_clustering = true;
        self
    }

    /// Restricts training to the first `m` points (§4.9).
    ///
    /// # Errors
    /// Returns [`ClusteringError::SubsampleTooLarge`] if `m` exceeds the
    /// dataset size.
    pub fn subsample(mut self, m: usize) -> Result<Self> {
        if m > self.points.len() {
            return Err(ClusteringError::SubsampleTooLarge {
                requested: m,
                available: self.points.len(),
            });
        }
        self.options.subsample = Some((0..m).collect());
        Ok(self)
    }

    /// Restricts training to `m` points uniformly sampled (without
    /// replacement) using the caller-supplied entropy source `rng` (§4.9).
    /// Reproducible whenever the caller fixes their own seed.
    ///
    /// # Errors
    /// Returns [`ClusteringError::SubsampleTooLarge`] if `m` exceeds the
    /// dataset size.
    pub fn subsample_with_rng<R: RngCore>(mut self, m: usize, rng: &mut R) -> Result<Self> {
        if m > self.points.len() {
            return Err(ClusteringError::SubsampleTooLarge {
                requested: m,
                available: self.points.len(),
            });
        }
        let mut indices: Vec<usize> = sample_indices(rng, self.points.len(), m).into_vec();
        indices.sort_unstable();
        self.options.subsample = Some(indices);
        Ok(self)
    }

    /// The dimension shared by every point.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.points.first().map_or(0, Vec::len)
    }

    /// The configured minimum cluster size.
    #[must_use]
    pub fn min_cluster_size(&self) -> usize {
        self.min_cluster_size.get()
    }

    /// Executes §§4.2–4.8 in order under the active option set.
    ///
    /// Single-shot: a second invocation on the same clustering returns
    /// [`ClusteringError::AlreadyRun`].
    ///
    /// # Errors
    /// Returns [`ClusteringError::AlreadyRun`] on a second invocation,
    /// [`ClusteringError::Distance`] if `distance` reports a NaN or negative
    /// value, and [`ClusteringError::DisconnectedGraph`] if the
    /// mutual-reachability graph cannot be fully connected.
    #[instrument(skip(self, distance, score), fields(n = self.points.len(), use_mst))]
    pub fn run<D, S>(&mut self, distance: D, score: S, use_mst: bool) -> Result<()>
    where
        D: Fn(&[f32], &[f32]) -> core::result::Result<f32, DistanceError> + Sync,
        S: Fn(&[usize], &[Vec<f32>]) -> f32,
    {
        if matches!(self.state, State::Run(_)) {
            return Err(ClusteringError::AlreadyRun);
        }

        let training_indices = self
            .options
            .subsample
            .clone()
            .unwrap_or_else(|| (0..self.points.len()).collect());
        let training_points: Vec<Vec<f32>> = training_indices
            .iter()
            .map(|&index| self.points[index].clone())
            .collect();
        let min_cluster_size = self.min_cluster_size.get();

        self.options.notify("core_distances");
        let core = crate::core_distance::core_distances(&training_points, min_cluster_size, &distance)?;
        #[cfg(feature = "metrics")]
        metrics::counter!("hdbscan_core_distances_computed").increment(training_points.len() as u64);

        self.options.notify("mutual_reachability");
        let edges = if use_mst {
            self.options.notify("mst");
            build_mst(&training_points, &core, &distance)?
        } else {
            all_edges_sorted(&training_points, &core, &distance)?
        };
        #[cfg(feature = "metrics")]
        metrics::counter!("hdbscan_edges_built").increment(edges.len() as u64);

        self.options.notify("dendrogram");
        let mut tree: Dendrogram = dendrogram::build(training_points.len(), &edges);

        self.options.notify("selection");
        let selected = select_clusters(&mut tree, min_cluster_size, &score, &training_points);
        if selected.is_empty() {
            warn!("selection produced no clusters");
        }

        let mut clusters: Vec<Cluster> = selected
            .iter()
            .enumerate()
            .map(|(output_id, &link_id)| {
                let link = tree.link(link_id);
                let candidate_score = crate::scoring::score_candidate(
                    &tree,
                    link_id,
                    min_cluster_size,
                    &score,
                    &training_points,
                );
                Cluster::new(output_id, link.points().to_vec(), candidate_score)
            })
            .collect();

        self.options.notify("postprocess");
        postprocess::compute_centroids(&mut clusters, &training_points);

        let mut unassigned =
            postprocess::unassigned_points(training_points.len(), &clusters);

        if self.options.outlier_detection {
            postprocess::attach_outliers(
                &mut clusters,
                &training_points,
                &unassigned,
                self.options.nearest_neighbor,
                &distance,
            )?;
            unassigned = postprocess::unassigned_points(training_points.len(), &clusters);
        }

        if self.options.outlier_clustering {
            let next_id = clusters.len();
            let promoted =
                postprocess::promote_outlier_clusters(&mut clusters, &training_points, min_cluster_size, next_id);
            clusters.extend(promoted);
        }

        if self.options.voronoi {
            postprocess::voronoi_fill(
                &mut clusters,
                &training_points,
                &unassigned,
                self.options.nearest_neighbor,
                &distance,
            )?;
        }

        // Remap training-local point indices back to original dataset indices.
        for cluster in &mut clusters {
            remap_cluster(cluster, &training_indices);
        }

        debug!(clusters = clusters.len(), "run complete");
        self.state = State::Run(RunOutputs {
            clusters,
            training_indices,
        });
        Ok(())
    }

    /// The clusters produced by [`Clustering::run`], in output-id order.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        match &self.state {
            State::Run(outputs) => &outputs.clusters,
            State::NotRun => &[],
        }
    }

    /// Whether [`Clustering::run`] has completed successfully.
    #[must_use]
    pub fn has_run(&self) -> bool {
        matches!(self.state, State::Run(_))
    }

    /// Assigns every point in `points` to the nearest trained cluster by the
    /// active nearness rule, appending it to that cluster's `points` (or
    /// `outliers`, when `OutlierDetection` is active) (§4.9).
    ///
    /// Does not mutate `self`; returns a new [`Clustering`] sharing the
    /// trained centroids.
    ///
    /// # Errors
    /// Returns [`ClusteringError::NotYetRun`] if `self` has not completed a
    /// successful [`Clustering::run`], and [`ClusteringError::Distance`] if
    /// `distance` misbehaves.
    #[instrument(skip(self, points, distance), fields(n = points.len()))]
    pub fn assign<D>(&self, points: &[Vec<f32>], distance: D) -> Result<Clustering>
    where
        D: Fn(&[f32], &[f32]) -> core::result::Result<f32, DistanceError>,
    {
        let State::Run(trained) = &self.state else {
            return Err(ClusteringError::NotYetRun);
        };

        let mut output: Vec<Cluster> = trained
            .clusters
            .iter()
            .map(|model| {
                let mut cluster = Cluster::new(model.id(), Vec::new(), model.score());
                cluster.set_centroid(model.centroid().to_vec());
                cluster.set_variance(model.variance());
                cluster
            })
            .collect();

        let mut raw_outliers: Vec<Vec<(usize, f32)>> = vec![Vec::new(); output.len()];
        for (index, point) in points.iter().enumerate() {
            let mut best: Option<(usize, f32)> = None;
            for (slot, model) in trained.clusters.iter().enumerate() {
                let d = if self.options.nearest_neighbor {
                    let mut nearest = f32::INFINITY;
                    for &member in model.points() {
                        let Some(member_point) = points.get(member) else {
                            continue;
                        };
                        let value = distance(point, member_point).map_err(|source| {
                            ClusteringError::Distance {
                                left: index,
                                right: member,
                                source,
                            }
                        })?;
                        let value = crate::error::validate_distance_result(value, index, member)?;
                        nearest = nearest.min(value);
                    }
                    nearest
                } else {
                    let value =
                        distance(point, model.centroid()).map_err(|source| ClusteringError::Distance {
                            left: index,
                            right: index,
                            source,
                        })?;
                    crate::error::validate_distance_result(value, index, index)?
                };
                if best.is_none_or(|(_, current)| d < current) {
                    best = Some((slot, d));
                }
            }
            let Some((slot, d)) = best else { continue };
            if self.options.outlier_detection {
                raw_outliers[slot].push((index, d));
            } else {
                output[slot].push_point(index);
            }
        }

        if self.options.outlier_detection {
            for (cluster, distances) in output.iter_mut().zip(raw_outliers) {
                if distances.is_empty() {
                    continue;
                }
                let max = distances.iter().map(|(_, d)| *d).fold(f32::MIN, f32::max);
                for (index, d) in distances {
                    let normalized = if max > 0.0 { d / max } else { 1.0 };
                    cluster.push_outlier(crate::result::Outlier::new(index, normalized));
                }
            }
        }

        Ok(Clustering {
            points: points.to_vec(),
            min_cluster_size: self.min_cluster_size,
            options: Options {
                voronoi: false,
                outlier_detection: self.options.outlier_detection,
                nearest_neighbor: self.options.nearest_neighbor,
                outlier_clustering: false,
                subsample: None,
                verbose: None,
            },
            state: State::Run(RunOutputs {
                clusters: output,
                training_indices: (0..points.len()).collect(),
            }),
        })
    }
}

fn remap_cluster(cluster: &mut Cluster, training_indices: &[usize]) {
    let remapped_points: Vec<usize> = cluster
        .points()
        .iter()
        .map(|&local| training_indices[local])
        .collect();
    let remapped_outliers: Vec<crate::result::Outlier> = cluster
        .outliers()
        .iter()
        .map(|outlier| {
            crate::result::Outlier::new(
                training_indices[outlier.index()],
                outlier.normalized_distance(),
            )
        })
        .collect();
    *cluster = {
        let mut rebuilt = Cluster::new(cluster.id(), remapped_points, cluster.score());
        rebuilt.set_centroid(cluster.centroid().to_vec());
        rebuilt.set_variance(cluster.variance());
        for outlier in remapped_outliers {
            rebuilt.push_outlier(outlier);
        }
        rebuilt
    };
}
