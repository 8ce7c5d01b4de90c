use thiserror::Error;

/// Errors produced while planning, computing, or accumulating a pan matrix
/// profile.
#[derive(Debug, Error)]
pub enum PanError {
    /// Invalid window-length configuration: bad `min_m`/`max_m`/`step`
    /// combination, an empty resulting window set, or a sampling
    /// percentage outside `(0, 1]`.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The series is too short for the requested window lengths, or the
    /// exclusion zone eliminates every candidate partner.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// A pan row was written twice. Rows are write-once; this indicates an
    /// internal invariant violation.
    #[error("pan row {row} already written")]
    DuplicateWrite { row: usize },

    /// A distributed task failed or the worker pool connection dropped.
    /// The affected row is left unwritten, so the triggering `update()`
    /// can be retried.
    #[error("worker execution failed: {0}")]
    WorkerExecution(String),
}

pub type Result<T> = std::result::Result<T, PanError>;
