use std::sync::mpsc;
use std::sync::Arc;

use log::debug;

use crate::algorithms::aamp::aamp;
use crate::algorithms::common::exclusion_zone;
use crate::algorithms::stimp::{PanState, DEFAULT_THRESHOLD};
use crate::core::error::{PanError, Result};

/// Handle to a pool of worker threads executing per-window-length profile
/// computations.
///
/// The pool is an externally owned, scoped resource: callers acquire it
/// with [`WorkerPool::new`] before building any dispatcher, may share it
/// across several dispatchers, and release it by dropping it after the
/// last one is done. Dispatchers only borrow the handle and never manage
/// its lifecycle.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("n_workers", &self.pool.current_num_threads())
            .finish()
    }
}

impl WorkerPool {
    /// Spin up a pool of `n_workers` threads.
    pub fn new(n_workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_workers)
            .thread_name(|i| format!("panmp-worker-{i}"))
            .build()
            .map_err(|e| PanError::WorkerExecution(format!("failed to build worker pool: {e}")))?;
        Ok(Self { pool })
    }

    /// Number of worker threads.
    pub fn n_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn spawn(&self, job: impl FnOnce() + Send + 'static) {
        self.pool.spawn(job);
    }
}

/// Pan matrix profile engine that fans per-window-length work out to a
/// worker pool.
///
/// The external contract matches [`crate::Stimp`] exactly: one `update()`
/// call materializes one scheduled window length, and the accumulated
/// matrices are identical to a local run over the same series (this
/// variant always computes exact profiles). Internally each update is
/// submitted to the pool as an independent task; the completion message
/// carries the task's row index, so results are attributed correctly no
/// matter which worker ran them. Because rows are write-once and disjoint,
/// tasks for different rows never contend.
///
/// A failed task (or a worker dying mid-computation) surfaces as a
/// [`PanError::WorkerExecution`] from the `update()` that awaited it; the
/// row stays unwritten and the call can be retried.
#[derive(Debug)]
pub struct Stimped<'p> {
    pool: &'p WorkerPool,
    ts: Arc<Vec<f64>>,
    state: PanState,
}

impl<'p> Stimped<'p> {
    /// Build a distributed engine over an externally managed pool.
    ///
    /// Window-length validation matches the local constructor; sampling
    /// options are not taken because this variant is exact-only.
    pub fn new(
        pool: &'p WorkerPool,
        ts: Vec<f64>,
        min_m: usize,
        max_m: Option<usize>,
        step: usize,
    ) -> Result<Self> {
        let state = PanState::new(&ts, min_m, max_m, step)?;
        Ok(Self {
            pool,
            ts: Arc::new(ts),
            state,
        })
    }

    /// Submit the next scheduled window length to the pool, wait for its
    /// completion, and store the result.
    ///
    /// No-op once all window lengths are processed.
    pub fn update(&mut self) -> Result<()> {
        let Some((row, m)) = self.state.next_scheduled() else {
            return Ok(());
        };
        let zone = exclusion_zone(m);

        let (tx, rx) = mpsc::channel();
        let ts = Arc::clone(&self.ts);
        self.pool.spawn(move || {
            let outcome = aamp(&ts, m, zone);
            // The receiver may have gone away; nothing to do about it here.
            let _ = tx.send((row, outcome));
        });

        // A worker that dies without sending drops the channel, which shows
        // up here as a receive failure rather than a hang.
        let (task_row, outcome) = rx.recv().map_err(|_| {
            PanError::WorkerExecution(format!(
                "worker dropped before completing window length {m}"
            ))
        })?;
        let profile = outcome.map_err(|e| {
            PanError::WorkerExecution(format!("task for window length {m} failed: {e}"))
        })?;

        debug!(
            "pan row {task_row} done on worker pool (m={m}, {}/{} window lengths)",
            self.state.n_processed() + 1,
            self.state.windows().len()
        );
        self.state.commit(task_row, profile)
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

    /// The raw accumulation matrix.
    pub fn pan(&self) -> &[Vec<f64>] {
        self.state.pan()
    }

    /// The normalized, threshold-collapsed visualization matrix.
    /// `None` uses [`DEFAULT_THRESHOLD`].
    pub fn transformed_pan(&self, threshold: Option<f64>) -> Vec<Vec<f64>> {
        self.state.transformed(threshold.unwrap_or(DEFAULT_THRESHOLD))
    }

    /// Distance rows processed so far, in schedule order.
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
    use crate::algorithms::stimp::{Stimp, StimpConfig};

    #[test]
    fn test_matches_local_engine() {
        let ts: Vec<f64> = (0..72)
            .map(|i| (i as f64 * 0.19).sin() * 40.0 + (i as f64 * 0.05).cos() * 9.0)
            .collect();
        let pool = WorkerPool::new(2).unwrap();

        let mut local = Stimp::new(ts.clone(), StimpConfig::exact(3)).unwrap();
        let mut distributed = Stimped::new(&pool, ts, 3, None, 1).unwrap();

        while !local.is_exhausted() {
            local.update().unwrap();
            distributed.update().unwrap();
        }
        assert!(distributed.is_exhausted());
        assert_eq!(local.pan(), distributed.pan());
        assert_eq!(local.neighbor_indices(), distributed.neighbor_indices());
        assert_eq!(local.transformed_pan(None), distributed.transformed_pan(None));
    }

    #[test]
    fn test_noop_after_exhaustion() {
        let ts: Vec<f64> = (0..20).map(|i| (i as f64).sin()).collect();
        let pool = WorkerPool::new(2).unwrap();
        let mut pan = Stimped::new(&pool, ts, 3, Some(6), 1).unwrap();

        while !pan.is_exhausted() {
            pan.update().unwrap();
        }
        let raw = pan.pan().to_vec();
        pan.update().unwrap();
        assert_eq!(pan.pan(), &raw[..]);
        assert_eq!(pan.n_processed(), 4);
    }

    #[test]
    fn test_pool_is_shared_across_engines() {
        let ts: Vec<f64> = (0..24).map(|i| (i as f64 * 0.8).cos() * 3.0).collect();
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.n_workers(), 3);

        let mut a = Stimped::new(&pool, ts.clone(), 3, Some(5), 1).unwrap();
        let mut b = Stimped::new(&pool, ts, 4, Some(6), 2).unwrap();
        a.update().unwrap();
        b.update().unwrap();
        assert_eq!(a.n_processed(), 1);
        assert_eq!(b.n_processed(), 1);
    }

    #[test]
    fn test_validation_matches_local_constructor() {
        let pool = WorkerPool::new(1).unwrap();
        let err = Stimped::new(&pool, vec![1.0, 2.0, 3.0], 3, Some(9), 1).unwrap_err();
        assert!(matches!(err, PanError::InsufficientData(_)));
    }
}
