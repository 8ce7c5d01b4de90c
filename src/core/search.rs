use crate::core::error::Result;
use crate::core::profile::LengthProfile;

/// Capability interface for the single-window-length self-join search
/// primitive.
///
/// The pan engine is agnostic to how the underlying nearest-neighbor search
/// is carried out; [`crate::algorithms::aamp::BruteForce`] backs it with a
/// dot-product-recurrence brute force, and an implementation backed by a
/// sampled or accelerated search can be substituted without touching the
/// engine.
///
/// The associated `Context` holds statistics precomputed once per
/// `(series, m)` pair (e.g. windowed sums of squares), so repeated per-query
/// evaluations during refinement avoid O(n) recomputation.
pub trait ProfileSearch: Send + Sync {
    /// Precomputed per-series statistics for `distance_profile` queries.
    type Context: Send + Sync;

    /// Precompute query context for subsequences of length `m` over `ts`.
    fn precompute(&self, ts: &[f64], m: usize) -> Self::Context;

    /// Exhaustive self-join: every subsequence pair outside the exclusion
    /// zone is compared once.
    fn exact_profile(&self, ts: &[f64], m: usize, exclusion_zone: usize)
        -> Result<LengthProfile>;

    /// Coarse pass evaluating only query positions `0, stride, 2*stride, ..`
    /// against all partners, a cheap upper-bound estimate per position.
    fn strided_profile(
        &self,
        ts: &[f64],
        m: usize,
        exclusion_zone: usize,
        stride: usize,
    ) -> Result<LengthProfile>;

    /// Distances from the subsequence starting at `idx` to every other
    /// subsequence start. No exclusion zone is applied; callers mask
    /// trivial matches themselves.
    fn distance_profile(&self, ts: &[f64], m: usize, idx: usize, ctx: &Self::Context)
        -> Vec<f64>;
}
