//! Incremental pan matrix profile computation.
//!
//! A pan matrix profile stacks nearest-neighbor distance profiles across a
//! whole range of subsequence window lengths. [`Stimp`] computes it one
//! window length per [`update`](Stimp::update) call, visiting lengths in
//! breadth-first order so a partially built pan is representative at every
//! stage; [`Stimped`] runs the same contract over a worker pool.

pub mod algorithms;
pub mod core;

pub use crate::algorithms::aamp::{aamp, aamp_strided, BruteForce};
pub use crate::algorithms::common::{exclusion_zone, sliding_dot_product};
pub use crate::algorithms::schedule::{bfs_indices, plan_windows, WindowPlan};
pub use crate::algorithms::scraamp::scraamp;
pub use crate::algorithms::stimp::{Stimp, StimpConfig, DEFAULT_THRESHOLD};
pub use crate::algorithms::stimped::{Stimped, WorkerPool};
pub use crate::core::accumulator::PanAccumulator;
pub use crate::core::error::{PanError, Result};
pub use crate::core::profile::LengthProfile;
pub use crate::core::search::ProfileSearch;
