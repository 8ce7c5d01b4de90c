use std::collections::VecDeque;

use crate::algorithms::common::exclusion_zone;
use crate::core::error::{PanError, Result};

/// The window lengths to evaluate, sorted ascending, together with the
/// breadth-first order in which the pan engine visits them.
///
/// `bfs_indices[k]` is the row-major index of the k-th window length to be
/// processed. Visiting midpoints first keeps a partially built pan spread
/// across the whole magnitude range instead of clustered at one end.
#[derive(Debug, Clone)]
pub struct WindowPlan {
    /// Window lengths in ascending (row-major) order.
    pub windows: Vec<usize>,
    /// Schedule position → row-major index permutation.
    pub bfs_indices: Vec<usize>,
}

/// Validate and build the window-length set for a series of `n` points.
///
/// `max_m` defaults to `n`, the largest length with at least one
/// subsequence start. The shortest window must leave at least one partner
/// outside its exclusion zone; longer windows are allowed to come up empty
/// (their profiles stay infinite).
pub fn plan_windows(
    n: usize,
    min_m: usize,
    max_m: Option<usize>,
    step: usize,
) -> Result<WindowPlan> {
    if min_m < 3 {
        return Err(PanError::Configuration(format!(
            "min_m must be >= 3, got {min_m}"
        )));
    }
    if step == 0 {
        return Err(PanError::Configuration("step must be >= 1".into()));
    }
    let max_m = match max_m {
        Some(v) if v < min_m => {
            return Err(PanError::Configuration(format!(
                "max_m ({v}) must be >= min_m ({min_m})"
            )));
        }
        Some(v) if v > n => {
            return Err(PanError::InsufficientData(format!(
                "max_m ({v}) exceeds series length ({n})"
            )));
        }
        Some(v) => v,
        None => n,
    };

    let windows: Vec<usize> = (min_m..=max_m).step_by(step).collect();
    if windows.is_empty() {
        return Err(PanError::Configuration(format!(
            "no window lengths in [{min_m}, {max_m}] for a series of {n} points"
        )));
    }

    // A pan where even the shortest window has no non-trivial partner is
    // vacuous: every row would be infinite.
    if n - min_m <= exclusion_zone(min_m) {
        return Err(PanError::InsufficientData(format!(
            "series of {n} points leaves no neighbor candidates outside the \
             exclusion zone for window length {min_m}"
        )));
    }

    let bfs_indices = bfs_indices(windows.len());
    Ok(WindowPlan {
        windows,
        bfs_indices,
    })
}

/// Breadth-first visitation order over the implicit balanced binary search
/// tree on `0..n`.
///
/// Built with an explicit queue of half-open index ranges: pop a range,
/// emit its midpoint (lower middle on even-length ranges), push the left
/// and right halves. Bounded memory, no recursion, and a pure function of
/// `n`: the same length always yields the same schedule.
pub fn bfs_indices(n: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(n);
    let mut queue = VecDeque::new();
    if n > 0 {
        queue.push_back((0, n));
    }
    while let Some((lo, hi)) = queue.pop_front() {
        let mid = lo + (hi - lo - 1) / 2;
        out.push(mid);
        if mid > lo {
            queue.push_back((lo, mid));
        }
        if mid + 1 < hi {
            queue.push_back((mid + 1, hi));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bfs_small_orders() {
        assert_eq!(bfs_indices(0), Vec::<usize>::new());
        assert_eq!(bfs_indices(1), vec![0]);
        assert_eq!(bfs_indices(2), vec![0, 1]);
        assert_eq!(bfs_indices(3), vec![1, 0, 2]);
        assert_eq!(bfs_indices(5), vec![2, 0, 3, 1, 4]);
        assert_eq!(bfs_indices(7), vec![3, 1, 5, 0, 2, 4, 6]);
    }

    #[test]
    fn test_bfs_is_permutation() {
        for n in [1, 2, 3, 4, 9, 31, 64, 100, 257] {
            let order = bfs_indices(n);
            assert_eq!(order.len(), n);
            let mut seen = vec![false; n];
            for &i in &order {
                assert!(!seen[i], "index {i} emitted twice for n={n}");
                seen[i] = true;
            }
        }
    }

    #[test]
    fn test_bfs_deterministic() {
        assert_eq!(bfs_indices(83), bfs_indices(83));
    }

    #[test]
    fn test_bfs_spreads_early() {
        // After the first few visits, processed indices should straddle
        // both halves of the range.
        let order = bfs_indices(100);
        let first3: Vec<usize> = order[..3].to_vec();
        assert!(first3.iter().any(|&i| i < 50));
        assert!(first3.iter().any(|&i| i >= 50));
    }

    #[test]
    fn test_plan_default_max() {
        let plan = plan_windows(7, 3, None, 1).unwrap();
        assert_eq!(plan.windows, vec![3, 4, 5, 6, 7]);
        assert_eq!(plan.bfs_indices, vec![2, 0, 3, 1, 4]);
    }

    #[test]
    fn test_plan_explicit_max_and_step() {
        let plan = plan_windows(50, 4, Some(12), 3).unwrap();
        assert_eq!(plan.windows, vec![4, 7, 10]);
    }

    #[test]
    fn test_plan_rejects_small_min() {
        let err = plan_windows(20, 2, None, 1).unwrap_err();
        assert!(matches!(err, PanError::Configuration(_)));
    }

    #[test]
    fn test_plan_rejects_zero_step() {
        let err = plan_windows(20, 3, None, 0).unwrap_err();
        assert!(matches!(err, PanError::Configuration(_)));
    }

    #[test]
    fn test_plan_rejects_inverted_range() {
        let err = plan_windows(20, 8, Some(5), 1).unwrap_err();
        assert!(matches!(err, PanError::Configuration(_)));
    }

    #[test]
    fn test_plan_rejects_oversized_max() {
        let err = plan_windows(10, 3, Some(11), 1).unwrap_err();
        assert!(matches!(err, PanError::InsufficientData(_)));
    }

    #[test]
    fn test_plan_empty_set_is_configuration_error() {
        // min_m exceeds the feasible range: default max_m = n = 2 < min_m
        let err = plan_windows(2, 3, None, 1).unwrap_err();
        assert!(matches!(err, PanError::Configuration(_)));
    }

    #[test]
    fn test_plan_rejects_vacuous_pan() {
        // n=4, min_m=3: zone = 1, and the only candidate pair is adjacent
        let err = plan_windows(4, 3, None, 1).unwrap_err();
        assert!(matches!(err, PanError::InsufficientData(_)));
    }
}
