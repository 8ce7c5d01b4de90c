use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::algorithms::aamp::BruteForce;
use crate::algorithms::common::exclusion_zone;
use crate::algorithms::schedule::plan_windows;
use crate::algorithms::scraamp::scraamp;
use crate::core::accumulator::PanAccumulator;
use crate::core::error::{PanError, Result};
use crate::core::profile::LengthProfile;
use crate::core::search::ProfileSearch;

/// Default collapse threshold for the transformed pan matrix.
pub const DEFAULT_THRESHOLD: f64 = 0.2;

/// Configuration for an incremental pan matrix profile run.
#[derive(Debug, Clone)]
pub struct StimpConfig {
    /// Shortest window length (>= 3).
    pub min_m: usize,
    /// Longest window length; defaults to the series length.
    pub max_m: Option<usize>,
    /// Stride between consecutive window lengths.
    pub step: usize,
    /// Fraction of start positions sampled during refinement, in (0, 1].
    /// At 1.0 every window length is computed exactly.
    pub percentage: f64,
    /// Whether to run the strided seed pass before refinement.
    pub pre_scraamp: bool,
    /// Seed for the sampling order; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl StimpConfig {
    /// Approximate defaults: 1% sampling with the seed pass enabled.
    pub fn new(min_m: usize) -> Self {
        Self {
            min_m,
            max_m: None,
            step: 1,
            percentage: 0.01,
            pre_scraamp: true,
            seed: None,
        }
    }

    /// Exact computation at every window length.
    pub fn exact(min_m: usize) -> Self {
        Self {
            percentage: 1.0,
            pre_scraamp: false,
            ..Self::new(min_m)
        }
    }
}

/// Owned engine state shared by the local and distributed update loops:
/// the window plan, the accumulation matrix, and the series extrema used
/// by the visualization transform.
///
/// Kept as an explicit struct (rather than ambient state) so independent
/// engines can coexist and the update loops stay testable in isolation.
#[derive(Debug, Clone)]
pub(crate) struct PanState {
    n: usize,
    windows: Vec<usize>,
    bfs_indices: Vec<usize>,
    accumulator: PanAccumulator,
    t_min: f64,
    t_max: f64,
}

impl PanState {
    pub(crate) fn new(
        ts: &[f64],
        min_m: usize,
        max_m: Option<usize>,
        step: usize,
    ) -> Result<Self> {
        let plan = plan_windows(ts.len(), min_m, max_m, step)?;
        let accumulator = PanAccumulator::new(plan.windows.len(), ts.len());
        let t_min = ts.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let t_max = ts.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        Ok(Self {
            n: ts.len(),
            windows: plan.windows,
            bfs_indices: plan.bfs_indices,
            accumulator,
            t_min,
            t_max,
        })
    }

    /// Row-major row and window length of the next unprocessed schedule
    /// position, or `None` once every row is filled.
    pub(crate) fn next_scheduled(&self) -> Option<(usize, usize)> {
        let k = self.accumulator.n_processed();
        if k == self.windows.len() {
            return None;
        }
        let row = self.bfs_indices[k];
        Some((row, self.windows[row]))
    }

    pub(crate) fn commit(&mut self, row: usize, profile: LengthProfile) -> Result<()> {
        self.accumulator.write(row, profile)
    }

    pub(crate) fn windows(&self) -> &[usize] {
        &self.windows
    }

    pub(crate) fn scheduled_windows(&self) -> Vec<usize> {
        self.bfs_indices.iter().map(|&r| self.windows[r]).collect()
    }

    pub(crate) fn bfs_indices(&self) -> &[usize] {
        &self.bfs_indices
    }

    pub(crate) fn n_processed(&self) -> usize {
        self.accumulator.n_processed()
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.n_processed() == self.windows.len()
    }

    pub(crate) fn pan(&self) -> &[Vec<f64>] {
        self.accumulator.pan()
    }

    pub(crate) fn transformed(&self, threshold: f64) -> Vec<Vec<f64>> {
        self.accumulator.transform(
            threshold,
            &self.bfs_indices,
            self.n_processed(),
            self.t_min,
            self.t_max,
        )
    }

    /// Distance row for schedule position `level`, trimmed to the valid
    /// subsequence starts for its window length.
    pub(crate) fn profile_at(&self, level: usize) -> Option<&[f64]> {
        if level >= self.n_processed() {
            return None;
        }
        let row = self.bfs_indices[level];
        let m = self.windows[row];
        Some(&self.accumulator.row_distances(row)[..self.n - m + 1])
    }

    /// Neighbor-index row for schedule position `level`.
    pub(crate) fn indices_at(&self, level: usize) -> Option<&[usize]> {
        if level >= self.n_processed() {
            return None;
        }
        Some(self.accumulator.row_indices(self.bfs_indices[level]))
    }

    pub(crate) fn profiles(&self) -> Vec<Vec<f64>> {
        (0..self.n_processed())
            .map(|k| self.profile_at(k).unwrap_or_default().to_vec())
            .collect()
    }

    pub(crate) fn neighbor_indices(&self) -> Vec<Vec<usize>> {
        (0..self.n_processed())
            .map(|k| self.indices_at(k).unwrap_or_default().to_vec())
            .collect()
    }
}

/// Incremental pan matrix profile engine.
///
/// Each [`update`](Stimp::update) call computes the self-join matrix
/// profile for exactly one more window length and accumulates it into the
/// pan matrix. Lengths are visited in breadth-first order over the sorted
/// window set, so a partial pan stays representative of the whole range.
/// Between calls the engine is idle; once every scheduled length is
/// processed it is exhausted and further calls are no-ops.
///
/// # Examples
///
/// ```
/// use panmp::{Stimp, StimpConfig};
///
/// let ts: Vec<f64> = (0..64).map(|i| (i as f64 * 0.3).sin()).collect();
/// let mut pan = Stimp::new(ts, StimpConfig::exact(8)).unwrap();
///
/// pan.update().unwrap();
/// assert_eq!(pan.n_processed(), 1);
///
/// while !pan.is_exhausted() {
///     pan.update().unwrap();
/// }
/// assert_eq!(pan.n_processed(), pan.windows().len());
/// ```
///
/// # References
/// Madrid et al., "Matrix Profile XX: Finding and Visualizing Time Series
/// Motifs of All Lengths using the Matrix Profile", 2019.
#[derive(Debug)]
pub struct Stimp<S: ProfileSearch = BruteForce> {
    ts: Vec<f64>,
    state: PanState,
    search: S,
    percentage: f64,
    pre_scraamp: bool,
    rng: StdRng,
}

impl Stimp<BruteForce> {
    /// Build an engine over the brute-force search backing.
    pub fn new(ts: Vec<f64>, config: StimpConfig) -> Result<Self> {
        Self::with_search(ts, config, BruteForce)
    }
}

impl<S: ProfileSearch> Stimp<S> {
    /// Build an engine over a caller-supplied search backing.
    ///
    /// All configuration and data-sufficiency validation happens here;
    /// `update` only surfaces per-row computation failures.
    pub fn with_search(ts: Vec<f64>, config: StimpConfig, search: S) -> Result<Self> {
        if !(config.percentage > 0.0 && config.percentage <= 1.0) {
            return Err(PanError::Configuration(format!(
                "sampling percentage must lie in (0, 1], got {}",
                config.percentage
            )));
        }
        let state = PanState::new(&ts, config.min_m, config.max_m, config.step)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            ts,
            state,
            search,
            percentage: config.percentage,
            pre_scraamp: config.pre_scraamp,
            rng,
        })
    }

    /// Compute and store the profile for the next scheduled window length.
    ///
    /// No-op once all window lengths are processed. On error the pan is
    /// left exactly as it was: the failed row stays unwritten and the
    /// call can be retried.
    pub fn update(&mut self) -> Result<()> {
        let Some((row, m)) = self.state.next_scheduled() else {
            return Ok(());
        };
        let zone = exclusion_zone(m);
        let profile = if self.percentage >= 1.0 {
            self.search.exact_profile(&self.ts, m, zone)?
        } else {
            scraamp(
                &self.search,
                &self.ts,
                m,
                zone,
                self.percentage,
                self.pre_scraamp,
                &mut self.rng,
            )?
        };
        debug!(
            "pan row {row} done (m={m}, {}/{} window lengths)",
            self.state.n_processed() + 1,
            self.state.windows().len()
        );
        self.state.commit(row, profile)
    }

    /// Window lengths in ascending (row-major) order.
    pub fn windows(&self) -> &[usize] {
        self.state.windows()
    }

    /// Window lengths in the order they are processed.
    pub fn scheduled_windows(&self) -> Vec<usize> {
        self.state.scheduled_windows()
    }

    /// Schedule position → row-major index permutation (diagnostic).
    pub fn bfs_indices(&self) -> &[usize] {
        self.state.bfs_indices()
    }

    /// Number of window lengths processed so far.
    pub fn n_processed(&self) -> usize {
        self.state.n_processed()
    }

    /// Whether every scheduled window length has been processed.
    pub fn is_exhausted(&self) -> bool {
        self.state.is_exhausted()
    }

    /// The raw accumulation matrix: one row per window length (row-major),
    /// one column per time index, infinity where no value exists.
    pub fn pan(&self) -> &[Vec<f64>] {
        self.state.pan()
    }

    /// The normalized, threshold-collapsed visualization matrix, derived
    /// on demand from the raw state. `None` uses [`DEFAULT_THRESHOLD`].
    pub fn transformed_pan(&self, threshold: Option<f64>) -> Vec<Vec<f64>> {
        self.state.transformed(threshold.unwrap_or(DEFAULT_THRESHOLD))
    }

    /// Distance rows processed so far, in schedule order, each trimmed to
    /// its window length's valid start positions.
    pub fn profiles(&self) -> Vec<Vec<f64>> {
        self.state.profiles()
    }

    /// Neighbor-index rows processed so far, in schedule order.
    pub fn neighbor_indices(&self) -> Vec<Vec<usize>> {
        self.state.neighbor_indices()
    }

    /// Distance row for one schedule position, if processed.
    pub fn profile_at(&self, level: usize) -> Option<&[f64]> {
        self.state.profile_at(level)
    }

    /// Neighbor-index row for one schedule position, if processed.
    pub fn indices_at(&self, level: usize) -> Option<&[usize]> {
        self.state.indices_at(level)
    }

    /// The underlying series.
    pub fn series(&self) -> &[f64] {
        &self.ts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: [f64; 7] = [584.0, -11.0, 23.0, 79.0, 1001.0, 0.0, -19.0];

    #[test]
    fn test_scenario_window_plan() {
        let pan = Stimp::new(SCENARIO.to_vec(), StimpConfig::exact(3)).unwrap();
        assert_eq!(pan.windows(), &[3, 4, 5, 6, 7]);
        assert_eq!(pan.bfs_indices(), &[2, 0, 3, 1, 4]);
        assert_eq!(pan.scheduled_windows(), vec![5, 3, 6, 4, 7]);
    }

    #[test]
    fn test_update_advances_one_row_at_a_time() {
        let mut pan = Stimp::new(SCENARIO.to_vec(), StimpConfig::exact(3)).unwrap();
        for expected in 1..=5 {
            pan.update().unwrap();
            assert_eq!(pan.n_processed(), expected);
        }
        assert!(pan.is_exhausted());
    }

    #[test]
    fn test_update_is_noop_after_exhaustion() {
        let mut pan = Stimp::new(SCENARIO.to_vec(), StimpConfig::exact(3)).unwrap();
        while !pan.is_exhausted() {
            pan.update().unwrap();
        }
        let raw = pan.pan().to_vec();
        let transformed = pan.transformed_pan(None);

        pan.update().unwrap();
        pan.update().unwrap();

        assert_eq!(pan.n_processed(), 5);
        assert_eq!(pan.pan(), &raw[..]);
        assert_eq!(pan.transformed_pan(None), transformed);
    }

    #[test]
    fn test_rows_are_left_aligned_and_padded() {
        let mut pan = Stimp::new(SCENARIO.to_vec(), StimpConfig::exact(3)).unwrap();
        while !pan.is_exhausted() {
            pan.update().unwrap();
        }
        // Row 0 is m=3: 5 valid columns, 2 infinite tail columns
        let row = &pan.pan()[0];
        assert_eq!(row.len(), 7);
        assert!(row[..5].iter().all(|d| d.is_finite()));
        assert!(row[5].is_infinite());
        assert!(row[6].is_infinite());
    }

    #[test]
    fn test_views_track_schedule_order() {
        let mut pan = Stimp::new(SCENARIO.to_vec(), StimpConfig::exact(3)).unwrap();
        pan.update().unwrap();
        pan.update().unwrap();

        // First two schedule positions are m=5 and m=3
        let profiles = pan.profiles();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].len(), 7 - 5 + 1);
        assert_eq!(profiles[1].len(), 7 - 3 + 1);
        assert_eq!(pan.neighbor_indices().len(), 2);

        assert_eq!(pan.profile_at(0).unwrap().len(), 3);
        assert_eq!(pan.profile_at(1).unwrap().len(), 5);
        assert!(pan.profile_at(2).is_none());
        assert!(pan.indices_at(2).is_none());
    }

    #[test]
    fn test_transformed_pan_bounds() {
        let ts: Vec<f64> = (0..48).map(|i| (i as f64 * 0.41).sin() * 7.0).collect();
        let mut pan = Stimp::new(ts, StimpConfig::exact(4)).unwrap();
        for _ in 0..10 {
            pan.update().unwrap();
        }
        let transformed = pan.transformed_pan(Some(0.3));
        let raw = pan.pan();
        for (row_t, row_r) in transformed.iter().zip(raw.iter()) {
            for (&t, &r) in row_t.iter().zip(row_r.iter()) {
                if t.is_finite() {
                    assert!((0.0..=1.0).contains(&t), "out of bounds: {t}");
                    assert!(t == 0.0 || t >= 0.3);
                    assert!(r.is_finite(), "finite transform from infinite raw entry");
                } else {
                    assert!(t.is_infinite());
                }
            }
        }
    }

    #[test]
    fn test_fixed_seed_reproduces_approximate_run() {
        let ts: Vec<f64> = (0..60)
            .map(|i| (i as f64 * 0.23).sin() * 12.0 - (i as f64 * 0.07).cos())
            .collect();
        let config = StimpConfig {
            percentage: 0.05,
            seed: Some(1234),
            ..StimpConfig::new(3)
        };

        let mut a = Stimp::new(ts.clone(), config.clone()).unwrap();
        let mut b = Stimp::new(ts, config).unwrap();
        for _ in 0..8 {
            a.update().unwrap();
            b.update().unwrap();
        }
        assert_eq!(a.pan(), b.pan());
        assert_eq!(a.neighbor_indices(), b.neighbor_indices());
    }

    #[test]
    fn test_invalid_percentage_rejected_eagerly() {
        for p in [0.0, -1.0, 1.01] {
            let config = StimpConfig {
                percentage: p,
                ..StimpConfig::new(3)
            };
            let err = Stimp::new(SCENARIO.to_vec(), config).unwrap_err();
            assert!(matches!(err, PanError::Configuration(_)), "percentage {p}");
        }
    }

    #[test]
    fn test_short_series_rejected_eagerly() {
        let err = Stimp::new(vec![1.0, 2.0], StimpConfig::exact(3)).unwrap_err();
        assert!(matches!(err, PanError::Configuration(_)));

        let err = Stimp::new(vec![1.0, 2.0, 3.0, 4.0], StimpConfig::exact(3)).unwrap_err();
        assert!(matches!(err, PanError::InsufficientData(_)));
    }
}
