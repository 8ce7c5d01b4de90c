use crate::core::error::{PanError, Result};
use crate::core::profile::LengthProfile;

/// Accumulates per-window-length profiles into one matrix.
///
/// The matrix has one row per scheduled window length (in sorted,
/// row-major order) and one column per time index, initialized to
/// `f64::INFINITY`. Row `r` holds the distance profile for the r-th window
/// length, left-aligned; columns past `n - m + 1` keep the infinity
/// sentinel because no subsequence of that length starts there.
///
/// Rows are write-once: each is filled by exactly one computation and never
/// revisited. Writes to distinct rows touch disjoint storage, which is what
/// makes concurrent row production race-free without locking.
#[derive(Debug, Clone)]
pub struct PanAccumulator {
    pan: Vec<Vec<f64>>,
    indices: Vec<Vec<usize>>,
    written: Vec<bool>,
    n_processed: usize,
}

impl PanAccumulator {
    /// Create an empty accumulator of `n_rows` window lengths over a series
    /// of `n_cols` points.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            pan: vec![vec![f64::INFINITY; n_cols]; n_rows],
            indices: vec![Vec::new(); n_rows],
            written: vec![false; n_rows],
            n_processed: 0,
        }
    }

    /// Store a computed profile into its row-major row.
    ///
    /// The distances are copied left-aligned; the rest of the row keeps the
    /// infinity sentinel. The row becomes visible atomically; there is no
    /// observable partially-written state.
    pub fn write(&mut self, row: usize, profile: LengthProfile) -> Result<()> {
        if self.written[row] {
            return Err(PanError::DuplicateWrite { row });
        }
        self.pan[row][..profile.distances.len()].copy_from_slice(&profile.distances);
        self.indices[row] = profile.indices;
        self.written[row] = true;
        self.n_processed += 1;
        Ok(())
    }

    /// Number of rows written so far.
    pub fn n_processed(&self) -> usize {
        self.n_processed
    }

    /// Whether the row-major `row` has been written.
    pub fn is_written(&self, row: usize) -> bool {
        self.written[row]
    }

    /// The raw accumulation matrix, row-major over sorted window lengths.
    pub fn pan(&self) -> &[Vec<f64>] {
        &self.pan
    }

    /// Untransformed distances for a row-major row (full column width,
    /// infinity-padded).
    pub fn row_distances(&self, row: usize) -> &[f64] {
        &self.pan[row]
    }

    /// Neighbor indices for a row-major row. Empty until the row is written.
    pub fn row_indices(&self, row: usize) -> &[usize] {
        &self.indices[row]
    }

    /// Derive the normalized, threshold-collapsed visualization matrix.
    ///
    /// For each of the first `n_processed` schedule positions, the row's
    /// finite distances are scaled by the series range `t_max - t_min`,
    /// clamped to `[0, 1]`, and values below `threshold` are collapsed to
    /// exactly `0.0`. Unwritten rows and infinity-padded tails pass through
    /// as infinity sentinels, renderable as "no data".
    ///
    /// Pure and idempotent: recomputable at any time from the raw state.
    pub fn transform(
        &self,
        threshold: f64,
        bfs_indices: &[usize],
        n_processed: usize,
        t_min: f64,
        t_max: f64,
    ) -> Vec<Vec<f64>> {
        let range = t_max - t_min;
        let scale = if range > 0.0 { 1.0 / range } else { 1.0 };

        let mut out = self.pan.clone();
        for &row in &bfs_indices[..n_processed] {
            for v in &mut out[row] {
                if v.is_finite() {
                    let norm = (*v * scale).min(1.0);
                    *v = if norm < threshold { 0.0 } else { norm };
                }
            }
        }
        out
    }
}
