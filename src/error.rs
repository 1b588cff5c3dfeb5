//! Error types for the clustering engine.
//!
//! Defines the error enum exposed by the public API, a stable machine-readable
//! code for each variant, and a convenient result alias.

use std::fmt;

use thiserror::Error;

use crate::distance::DistanceError as CapabilityDistanceError;

/// Stable codes describing [`ClusteringError`] variants.
///
/// Codes are independent of the (unstable, human-oriented) `Display` message
/// on [`ClusteringError`] itself, so callers can match on them for metrics or
/// log correlation without coupling to wording.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ClusteringErrorCode {
    /// The point set or `min_cluster_size` failed constructor validation.
    InvalidConfiguration,
    /// A subsample size exceeded the trained dataset.
    SubsampleTooLarge,
    /// The distance function returned a NaN or negative value.
    InvalidDistance,
    /// Fewer than `n - 1` finite edges were available to connect the graph.
    DisconnectedGraph,
    /// `Run` was invoked on a clustering that had already run.
    AlreadyRun,
    /// `Assign` was invoked before a successful `Run`.
    NotYetRun,
}

impl ClusteringErrorCode {
    /// Returns the symbolic identifier for logging and metrics surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidConfiguration => "CLUSTERING_INVALID_CONFIGURATION",
            Self::SubsampleTooLarge => "CLUSTERING_SUBSAMPLE_TOO_LARGE",
            Self::InvalidDistance => "CLUSTERING_INVALID_DISTANCE",
            Self::DisconnectedGraph => "CLUSTERING_DISCONNECTED_GRAPH",
            Self::AlreadyRun => "CLUSTERING_ALREADY_RUN",
            Self::NotYetRun => "CLUSTERING_NOT_YET_RUN",
        }
    }
}

impl fmt::Display for ClusteringErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error produced while configuring, running, or querying a clustering.
///
/// Groups the four kinds of failure the engine can surface: configuration
/// (rejected at construction), distance (a pluggable metric misbehaved),
/// graph (the mutual-reachability graph could not be connected), and state
/// (the single-shot `Run`/`Assign` lifecycle was violated).
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ClusteringError {
    /// The point set was empty.
    #[error("point set must contain at least one point")]
    EmptyPoints,
    /// Points did not share a common, positive dimension.
    #[error("dimension mismatch: point {index} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        found: usize,
        expected: usize,
    },
    /// `min_cluster_size` was zero or one.
    #[error("min_cluster_size must be at least 2 (got {got})")]
    InvalidMinClusterSize { got: usize },
    /// Fewer than `2 * min_cluster_size` points were supplied.
    #[error(
        "point count {points} is smaller than 2 * min_cluster_size ({required}); \
         core distances are undefined"
    )]
    InsufficientPoints { points: usize, required: usize },
    /// `Subsample(m)` requested more points than the dataset contains.
    #[error("subsample size {requested} exceeds dataset size {available}")]
    SubsampleTooLarge { requested: usize, available: usize },
    /// The distance function returned a NaN or negative value.
    #[error("distance between point {left} and point {right} was invalid: {source}")]
    Distance {
        left: usize,
        right: usize,
        #[source]
        source: CapabilityDistanceError,
    },
    /// The mutual-reachability graph could not be connected.
    #[error(
        "mutual-reachability graph is disconnected: only {connected} of {expected} required \
         edges were finite"
    )]
    DisconnectedGraph { connected: usize, expected: usize },
    /// `Run` was invoked on a clustering that had already run.
    #[error("Run was already invoked on this clustering")]
    AlreadyRun,
    /// `Assign` was invoked before a successful `Run`.
    #[error("Assign requires a prior successful Run")]
    NotYetRun,
}

impl ClusteringError {
    /// Retrieve the stable [`ClusteringErrorCode`] for this error.
    #[must_use]
    pub const fn code(&self) -> ClusteringErrorCode {
        match self {
            Self::EmptyPoints
            | Self::DimensionMismatch { .. }
            | Self::InvalidMinClusterSize { .. }
            | Self::InsufficientPoints { .. } => ClusteringErrorCode::InvalidConfiguration,
            Self::SubsampleTooLarge { .. } => ClusteringErrorCode::SubsampleTooLarge,
            Self::Distance { .. } => ClusteringErrorCode::InvalidDistance,
            Self::DisconnectedGraph { .. } => ClusteringErrorCode::DisconnectedGraph,
            Self::AlreadyRun => ClusteringErrorCode::AlreadyRun,
            Self::NotYetRun => ClusteringErrorCode::NotYetRun,
        }
    }
}

/// Convenient alias for results returned by the clustering API.
pub type Result<T> = core::result::Result<T, ClusteringError>;

/// Validates a scalar a distance capability returned for the pair `(left,
/// right)` (§4.1, §7): it must be finite and non-negative. Every call site
/// that invokes a caller-supplied distance function routes its `Ok` value
/// through this check so a misbehaving metric is caught here rather than
/// flowing on as a silent NaN/negative weight.
pub(crate) fn validate_distance_result(value: f32, left: usize, right: usize) -> Result<f32> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ClusteringError::Distance {
            left,
            right,
            source: CapabilityDistanceError::InvalidResult { value },
        })
    }
}
