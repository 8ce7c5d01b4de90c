use realfft::RealFftPlanner;

/// Exclusion zone denominator: zone = ceil(m / 4), matching the reference
/// matrix profile literature.
pub const EXCLUSION_ZONE_DENOM: usize = 4;

/// Size threshold (n * m) above which the sliding dot product dispatches to
/// the FFT path. Below this, the naive O(n*m) loop wins on constant
/// overhead.
const FFT_THRESHOLD: usize = 256 * 1024;

/// Radius of the trivial-match exclusion zone for window length `m`.
#[inline]
pub fn exclusion_zone(m: usize) -> usize {
    (m as f64 / EXCLUSION_ZONE_DENOM as f64).ceil() as usize
}

/// Sum of squares of every length-`m` window of `ts`, via one cumulative
/// pass.
///
/// `out[i]` = sum of `ts[i..i+m]` squared. Together with a dot product QT
/// this yields the non-normalized Euclidean distance
/// `d(i,j) = sqrt(out[i] + out[j] - 2*QT)`.
pub fn windowed_sum_squares(ts: &[f64], m: usize) -> Vec<f64> {
    debug_assert!(m >= 1 && ts.len() >= m);
    let n = ts.len();

    let mut cumsum_sq = vec![0.0; n + 1];
    for i in 0..n {
        cumsum_sq[i + 1] = cumsum_sq[i] + ts[i] * ts[i];
    }

    (0..n - m + 1)
        .map(|i| cumsum_sq[i + m] - cumsum_sq[i])
        .collect()
}

/// Sliding dot product between a query subsequence `q` and every window of
/// `ts`: element `i` is `dot(q, ts[i..i+m])`.
///
/// Dispatches to an FFT-based O(n log n) implementation for large inputs
/// and falls back to the direct O(n*m) loop otherwise.
pub fn sliding_dot_product(q: &[f64], ts: &[f64]) -> Vec<f64> {
    let m = q.len();
    let n = ts.len();
    debug_assert!(n >= m);
    if n * m > FFT_THRESHOLD {
        sliding_dot_product_fft(q, ts)
    } else {
        sliding_dot_product_naive(q, ts)
    }
}

/// Direct O(n*m) sliding dot product.
pub fn sliding_dot_product_naive(q: &[f64], ts: &[f64]) -> Vec<f64> {
    let m = q.len();
    let n_subs = ts.len() - m + 1;
    (0..n_subs)
        .map(|i| q.iter().zip(&ts[i..i + m]).map(|(a, b)| a * b).sum())
        .collect()
}

/// FFT-based O(n log n) sliding dot product via cross-correlation: forward
/// transform of the reversed, zero-padded query and the padded series,
/// pointwise multiply, inverse transform, then read the valid lags.
pub fn sliding_dot_product_fft(q: &[f64], ts: &[f64]) -> Vec<f64> {
    let m = q.len();
    let n = ts.len();
    let n_subs = n - m + 1;
    let fft_len = (n + m - 1).next_power_of_two();

    let mut planner = RealFftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let mut q_padded = vec![0.0; fft_len];
    for i in 0..m {
        q_padded[i] = q[m - 1 - i];
    }
    let mut ts_padded = vec![0.0; fft_len];
    ts_padded[..n].copy_from_slice(ts);

    let mut q_spectrum = forward.make_output_vec();
    let mut ts_spectrum = forward.make_output_vec();
    // Buffers are exactly fft_len long, so process() cannot fail.
    forward.process(&mut q_padded, &mut q_spectrum).unwrap();
    forward.process(&mut ts_padded, &mut ts_spectrum).unwrap();

    for (qs, ts_val) in q_spectrum.iter_mut().zip(ts_spectrum.iter()) {
        *qs *= ts_val;
    }

    let mut conv = vec![0.0; fft_len];
    inverse.process(&mut q_spectrum, &mut conv).unwrap();

    // realfft's inverse is unnormalized
    let norm = 1.0 / fft_len as f64;
    conv[m - 1..m - 1 + n_subs]
        .iter()
        .map(|&x| x * norm)
        .collect()
}

/// Mask the trivial-match zone around `idx`, setting entries in
/// `[idx - zone, idx + zone]` (clamped) to infinity.
#[inline]
pub fn apply_exclusion_zone(profile: &mut [f64], idx: usize, zone: usize) {
    let start = idx.saturating_sub(zone);
    let end = (idx + zone + 1).min(profile.len());
    for val in &mut profile[start..end] {
        *val = f64::INFINITY;
    }
}
