//! Error types for the concurrency helpers.

use thiserror::Error;

/// Returned by a task that stopped because it observed cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("interrupted")]
pub struct Interrupted;

/// Failure of one or both sides of `ParallelExecutor::do_parallel`.
///
/// `cause` is the first failure observed; if the other side also failed, its
/// error is kept in `suppressed`.
#[derive(Debug, Error)]
#[error("parallel execution failed: {cause}")]
pub struct ParallelExecutionError {
    #[source]
    pub cause: anyhow::Error,
    pub suppressed: Option<anyhow::Error>,
}

/// Work group errors.
#[derive(Debug, Error)]
pub enum WorkGroupError {
    /// The group was shut down; new tasks are rejected.
    #[error("work group '{group}' is shut down")]
    ShutDown { group: String },

    /// A task failed and the group aborted. Carries the first failure.
    #[error("work group '{group}' aborted: {source}")]
    TaskFailed {
        group: String,
        #[source]
        source: anyhow::Error,
    },

    /// A worker thread could not be spawned.
    #[error("work group '{group}' could not spawn a worker: {reason}")]
    Spawn { group: String, reason: String },
}
