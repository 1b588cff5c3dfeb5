//! Pre-flight memory estimation for the clustering pipeline (§5).
//!
//! Provides a conservative estimate of peak memory consumption so callers can
//! reject oversized datasets before committing to the O(n²) mutual-reachability
//! allocation. The estimate is intentionally pessimistic — it uses a safety
//! multiplier to account for heap fragmentation, Rayon thread-local buffers,
//! and transient allocations that are difficult to predict statically.

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Safety multiplier applied to the raw estimate: 1.5×, expressed as an
/// integer ratio to avoid floating-point arithmetic in the estimator itself.
const SAFETY_MULTIPLIER_NUMERATOR: u64 = 3;
const SAFETY_MULTIPLIER_DENOMINATOR: u64 = 2;

/// Size of a single [`crate::mutual_reachability::Edge`] / MST edge
/// (`source: usize`, `target: usize`, `weight: f32`, `sequence: u64`),
/// including alignment padding on 64-bit platforms.
const EDGE_BYTES: u64 = 32;

/// Fixed per-[`crate::dendrogram::Link`] overhead (id, weight, lambda_min,
/// size, parent/children ids, delta flag, and the `Vec<usize>` header for
/// `points`), excluding the heap buffer backing `points` itself, which is
/// accounted for separately via [`dendrogram_points_worst_case`].
const LINK_OVERHEAD_BYTES: u64 = 96;

/// Size of a `usize` on 64-bit platforms, used for core-distance neighbour
/// scans and dendrogram point-set entries.
const USIZE_BYTES: u64 = 8;

/// Size of an `f32`, used for core distances and point coordinates.
const F32_BYTES: u64 = 4;

// ---------------------------------------------------------------------------
// Estimation
// ---------------------------------------------------------------------------

fn dendrogram_points_worst_case(n: u64) -> u64 {
    // Each of the n - 1 links materializes its own `points: Vec<usize>`
    // (§3). In the worst case (a fully serial merge chain) the sizes sum to
    // n + (n - 1) + ... + 2, i.e. O(n^2); this bounds that worst case rather
    // than the typical, much smaller, balanced-tree total.
    comb2(n).saturating_mul(USIZE_BYTES)
}

fn comb2(n: u64) -> u64 {
    n.saturating_mul(n.saturating_sub(1)) / 2
}

/// Returns a conservative estimate of peak memory (in bytes) the pipeline
/// will require for `point_count` points of dimension `dimension`.
///
/// The estimate covers:
///
/// - Point storage (`n * dimension * sizeof(f32)`).
/// - The core-distance vector (`n * sizeof(f32)`).
/// - The mutual-reachability edge set, materialized densely in the worst
///   case (`n * (n - 1) / 2` edges) — the path taken whenever the MST step
///   is disabled (§4.4).
/// - The dendrogram's link arena (`n - 1` links) plus the worst-case total
///   size of their materialized `points` sets.
///
/// A 1.5× safety multiplier is applied to the raw total to account for heap
/// fragmentation, Rayon thread-local buffers, and transient allocations.
///
/// # Examples
///
/// ```
/// use talus::estimate_peak_bytes;
///
/// let bytes = estimate_peak_bytes(1_000, 8);
/// assert!(bytes > 0, "estimate must be positive for non-empty datasets");
///
/// let zero = estimate_peak_bytes(0, 8);
/// assert_eq!(zero, 0, "empty dataset requires no memory");
/// ```
#[must_use]
pub fn estimate_peak_bytes(point_count: usize, dimension: usize) -> u64 {
    if point_count == 0 {
        return 0;
    }

    let n = point_count as u64;
    let d = dimension as u64;

    let point_storage = n.saturating_mul(d).saturating_mul(F32_BYTES);
    let core_distances = n.saturating_mul(F32_BYTES);
    let mutual_reachability_edges = comb2(n).saturating_mul(EDGE_BYTES);
    let links = n.saturating_sub(1).saturating_mul(LINK_OVERHEAD_BYTES);
    let dendrogram_points = dendrogram_points_worst_case(n);

    let subtotal = point_storage
        .saturating_add(core_distances)
        .saturating_add(mutual_reachability_edges)
        .saturating_add(links)
        .saturating_add(dendrogram_points);

    subtotal
        .saturating_mul(SAFETY_MULTIPLIER_NUMERATOR)
        .saturating_div(SAFETY_MULTIPLIER_DENOMINATOR)
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Formats a byte count as a human-readable string using binary units.
///
/// Returns values like `"0 B"`, `"1.0 KiB"`, `"2.4 GiB"`. The result uses one
/// decimal place for values ≥ 1 KiB.
///
/// # Examples
///
/// ```
/// use talus::format_bytes;
///
/// assert_eq!(format_bytes(0), "0 B");
/// assert_eq!(format_bytes(1023), "1023 B");
/// assert_eq!(format_bytes(1024), "1.0 KiB");
/// assert_eq!(format_bytes(1_073_741_824), "1.0 GiB");
/// ```
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    const GIB: u64 = 1024 * MIB;
    const TIB: u64 = 1024 * GIB;

    if bytes >= TIB {
        format!("{:.1} TiB", bytes as f64 / TIB as f64)
    } else if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
