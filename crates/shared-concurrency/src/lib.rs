//! # Shared Concurrency
//!
//! Generic helpers underlying the event stream pipeline and other pipelined work.
//!
//! ## Components
//!
//! | Type | Purpose |
//! |------|---------|
//! | `ParallelExecutor` | Run a foreground and a background closure concurrently, always await both |
//! | `StandardWorkGroup` | Named fixed-size thread pool for one logical unit of work; first failure aborts the group |
//! | `CancellationToken` | Cooperative interruption, selectable alongside channel receives |
//! | `Interrupted` | Error marker: a task stopped because it was interrupted, not because it failed |
//!
//! ## Failure Model
//!
//! Task closures return `anyhow::Result`. An error that downcasts to
//! `Interrupted` is an interruption and never counts as a failure. Any other
//! error, or a panic, is a failure.

pub mod cancellation;
pub mod error;
pub mod parallel_executor;
pub mod work_group;

pub use cancellation::CancellationToken;
pub use error::{Interrupted, ParallelExecutionError, WorkGroupError};
pub use parallel_executor::ParallelExecutor;
pub use work_group::StandardWorkGroup;

use std::any::Any;

/// Render a panic payload for logging.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Returns true if `error` is an interruption rather than a failure.
pub fn is_interruption(error: &anyhow::Error) -> bool {
    error.downcast_ref::<Interrupted>().is_some()
}
