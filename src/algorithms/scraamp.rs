use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::core::error::{PanError, Result};
use crate::core::profile::LengthProfile;
use crate::core::search::ProfileSearch;

/// Approximate self-join matrix profile via sample-then-refine.
///
/// At `percentage >= 1.0` this is the exhaustive search. Otherwise:
///
/// 1. **Seed** (when `pre_pass` is set): a strided coarse pass at
///    `stride = exclusion_zone` produces an initial upper-bound estimate
///    per position.
/// 2. **Refine**: a `percentage` fraction of all subsequence start
///    positions, drawn in an order determined by the caller's RNG, is each
///    compared against every non-excluded partner. Estimates improve
///    monotonically: a refined position lands on its true nearest
///    neighbor, and seeded estimates survive numerical ties.
///
/// Pure given the RNG state: the same seed replays the same sampling order.
///
/// # Arguments
/// * `search` - Backing search primitive
/// * `ts` - Time series
/// * `m` - Subsequence window length
/// * `exclusion_zone` - Trivial-match radius, also the seed-pass stride
/// * `percentage` - Fraction of start positions to refine, in (0.0, 1.0].
///   At 1.0, returns the exact profile.
/// * `pre_pass` - Whether to run the strided seed pass first
/// * `rng` - Source of the sampling order
///
/// # References
/// Zhu et al., "Matrix Profile XI: SCRIMP++: Time Series Motif Discovery
/// at Interactive Speeds", 2018 (sample-then-refine scheme).
pub fn scraamp<S: ProfileSearch>(
    search: &S,
    ts: &[f64],
    m: usize,
    exclusion_zone: usize,
    percentage: f64,
    pre_pass: bool,
    rng: &mut StdRng,
) -> Result<LengthProfile> {
    if !(percentage > 0.0 && percentage <= 1.0) {
        return Err(PanError::Configuration(format!(
            "sampling percentage must lie in (0, 1], got {percentage}"
        )));
    }
    if percentage >= 1.0 {
        return search.exact_profile(ts, m, exclusion_zone);
    }
    if m > ts.len() {
        return Err(PanError::InsufficientData(format!(
            "window length {m} exceeds series length {}",
            ts.len()
        )));
    }
    let n_subs = ts.len() - m + 1;

    let mut profile = if pre_pass {
        search.strided_profile(ts, m, exclusion_zone, exclusion_zone.max(1))?
    } else {
        LengthProfile::new(n_subs)
    };

    let ctx = search.precompute(ts, m);
    let mut order: Vec<usize> = (0..n_subs).collect();
    order.shuffle(rng);
    let n_samples = ((percentage * n_subs as f64).ceil() as usize).clamp(1, n_subs);

    for &i in &order[..n_samples] {
        let dp = search.distance_profile(ts, m, i, &ctx);
        for (j, &d) in dp.iter().enumerate() {
            if j.abs_diff(i) <= exclusion_zone {
                continue;
            }
            profile.update(i, d, j);
            profile.update(j, d, i);
        }
    }

    Ok(profile)
}
