//! Shared test utilities for `talus`.

use std::env;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use proptest::test_runner::Config as ProptestConfig;

use crate::distance::DistanceError;

const PROPTEST_CASES_ENV_KEY: &str = "PROPTEST_CASES";
const TALUS_PBT_FORK_ENV_KEY: &str = "TALUS_PBT_FORK";

/// Builds a standard proptest configuration, honoring `PROPTEST_CASES` and
/// `TALUS_PBT_FORK` environment overrides so every property suite in this
/// crate shares one CI tuning policy.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let cases = env::var(PROPTEST_CASES_ENV_KEY)
        .ok()
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .filter(|&value| value > 0)
        .unwrap_or(default_cases);
    let fork = env::var(TALUS_PBT_FORK_ENV_KEY)
        .ok()
        .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false);
    ProptestConfig {
        cases,
        fork,
        ..ProptestConfig::default()
    }
}

/// A distance capability wrapper that counts invocations, for tests that
/// assert on how many pairwise comparisons a pipeline stage performs.
///
/// # Examples
/// ```ignore
/// use std::sync::{Arc, atomic::AtomicUsize};
///
/// let counter = Arc::new(AtomicUsize::new(0));
/// let counting = CountingDistance::new(Arc::clone(&counter), |a: &[f32], b: &[f32]| {
///     Ok((a[0] - b[0]).abs())
/// });
/// assert_eq!(counting.call(&[0.0], &[1.0]).unwrap(), 1.0);
/// assert_eq!(counter.load(std::sync::atomic::Ordering::Relaxed), 1);
/// ```
pub(crate) struct CountingDistance<F> {
    calls: Arc<AtomicUsize>,
    inner: F,
}

impl<F> CountingDistance<F>
where
    F: Fn(&[f32], &[f32]) -> Result<f32, DistanceError>,
{
    pub(crate) fn new(calls: Arc<AtomicUsize>, inner: F) -> Self {
        Self { calls, inner }
    }

    pub(crate) fn calls(&self) -> &Arc<AtomicUsize> {
        &self.calls
    }

    pub(crate) fn call(&self, left: &[f32], right: &[f32]) -> Result<f32, DistanceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        (self.inner)(left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suite_proptest_config_defaults_without_env_overrides() {
        let config = suite_proptest_config(42);
        assert!(config.cases >= 1);
    }

    #[test]
    fn counting_distance_tracks_invocations() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counting = CountingDistance::new(Arc::clone(&calls), |a: &[f32], b: &[f32]| {
            Ok((a[0] - b[0]).abs())
        });
        assert_eq!(counting.call(&[0.0], &[1.0]).expect("ok"), 1.0);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}
