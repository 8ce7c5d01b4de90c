use crate::algorithms::common::{sliding_dot_product, windowed_sum_squares};
use crate::core::error::{PanError, Result};
use crate::core::profile::LengthProfile;
use crate::core::search::ProfileSearch;

/// Non-normalized Euclidean distance between the windows at `i` and `j`,
/// from their precomputed sums of squares and dot product:
/// `d = sqrt(ss[i] + ss[j] - 2*QT)`, clamped at zero against rounding.
#[inline]
fn pair_distance(sum_sq: &[f64], qt: f64, i: usize, j: usize) -> f64 {
    (sum_sq[i] + sum_sq[j] - 2.0 * qt).max(0.0).sqrt()
}

fn validate(ts: &[f64], m: usize) -> Result<usize> {
    if m < 2 {
        return Err(PanError::Configuration(format!(
            "window length must be >= 2, got {m}"
        )));
    }
    if m > ts.len() {
        return Err(PanError::InsufficientData(format!(
            "window length {m} exceeds series length {}",
            ts.len()
        )));
    }
    Ok(ts.len() - m + 1)
}

/// Exact self-join matrix profile under non-normalized Euclidean distance.
///
/// Walks the diagonals of the (implicit) pairwise distance matrix. Along
/// diagonal `k` the dot product obeys
/// `QT[i][j] = QT[i-1][j-1] - T[i-1]*T[j-1] + T[i+m-1]*T[j+m-1]`,
/// so each pair costs O(1) after one sliding dot product, giving O(n^2)
/// total instead of O(n^2 * m). Diagonals `k <= exclusion_zone` are trivial
/// matches and skipped entirely; each visited pair updates both of its
/// endpoints.
///
/// Positions left without any valid partner (the exclusion zone can cover
/// the whole series for large `m`) keep an infinite distance.
pub fn aamp(ts: &[f64], m: usize, exclusion_zone: usize) -> Result<LengthProfile> {
    let n_subs = validate(ts, m)?;
    let sum_sq = windowed_sum_squares(ts, m);
    let mut profile = LengthProfile::new(n_subs);

    let qt_first = sliding_dot_product(&ts[..m], ts);

    for k in (exclusion_zone + 1)..n_subs {
        let mut qt = qt_first[k];

        let d = pair_distance(&sum_sq, qt, 0, k);
        profile.update(0, d, k);
        profile.update(k, d, 0);

        for i in 1..(n_subs - k) {
            let j = i + k;
            qt = qt - ts[i - 1] * ts[j - 1] + ts[i + m - 1] * ts[j + m - 1];
            let d = pair_distance(&sum_sq, qt, i, j);
            profile.update(i, d, j);
            profile.update(j, d, i);
        }
    }

    Ok(profile)
}

/// Coarse strided self-join pass: evaluate only the query positions
/// `0, stride, 2*stride, ..` against all partners, updating both endpoints
/// of each pair.
///
/// Produces an upper-bound (distance, index) estimate per position at a
/// fraction of the exact cost; a refinement pass can only improve on it.
pub fn aamp_strided(
    ts: &[f64],
    m: usize,
    exclusion_zone: usize,
    stride: usize,
) -> Result<LengthProfile> {
    let n_subs = validate(ts, m)?;
    let stride = stride.max(1);
    let sum_sq = windowed_sum_squares(ts, m);
    let mut profile = LengthProfile::new(n_subs);

    for i in (0..n_subs).step_by(stride) {
        let qts = sliding_dot_product(&ts[i..i + m], ts);
        for j in 0..n_subs {
            if j.abs_diff(i) <= exclusion_zone {
                continue;
            }
            let d = pair_distance(&sum_sq, qts[j], i, j);
            profile.update(i, d, j);
            profile.update(j, d, i);
        }
    }

    Ok(profile)
}

/// Brute-force backing for [`ProfileSearch`], built on the QT dot-product
/// recurrence and non-normalized Euclidean distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForce;

impl ProfileSearch for BruteForce {
    /// Windowed sums of squares of the series.
    type Context = Vec<f64>;

    fn precompute(&self, ts: &[f64], m: usize) -> Self::Context {
        windowed_sum_squares(ts, m)
    }

    fn exact_profile(&self, ts: &[f64], m: usize, exclusion_zone: usize)
        -> Result<LengthProfile> {
        aamp(ts, m, exclusion_zone)
    }

    fn strided_profile(
        &self,
        ts: &[f64],
        m: usize,
        exclusion_zone: usize,
        stride: usize,
    ) -> Result<LengthProfile> {
        aamp_strided(ts, m, exclusion_zone, stride)
    }

    fn distance_profile(&self, ts: &[f64], m: usize, idx: usize, ctx: &Self::Context)
        -> Vec<f64> {
        let qts = sliding_dot_product(&ts[idx..idx + m], ts);
        qts.iter()
            .enumerate()
            .map(|(j, &qt)| pair_distance(ctx, qt, idx, j))
            .collect()
    }
}
