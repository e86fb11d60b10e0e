//! Fork-join of exactly two closures.
//!
//! `do_parallel` runs `background` on a dedicated named thread while
//! `foreground` runs on the caller's thread. Both are always awaited, even if
//! one fails. The first failure (by time) becomes the cause of the returned
//! error, the other side's failure is kept as suppressed, and `on_throw` runs
//! at most once, as soon as the first failure is seen, so the side still running
//! can react early.

use crate::error::ParallelExecutionError;
use crate::panic_message;
use anyhow::anyhow;
use parking_lot::Mutex;
use tracing::debug;

/// Runs pairs of closures concurrently.
#[derive(Debug, Clone)]
pub struct ParallelExecutor {
    name: String,
}

impl ParallelExecutor {
    /// `name` prefixes the background thread's name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `foreground` here and `background` on another thread, awaiting both.
    ///
    /// # Errors
    /// `ParallelExecutionError` if either side returned an error, the background
    /// side panicked, or the background thread could not be spawned.
    pub fn do_parallel<T, U, F, B, H>(
        &self,
        foreground: F,
        background: B,
        on_throw: H,
    ) -> Result<(T, U), ParallelExecutionError>
    where
        F: FnOnce() -> anyhow::Result<T>,
        B: FnOnce() -> anyhow::Result<U> + Send,
        U: Send,
        H: FnOnce() + Send,
    {
        let on_throw = Mutex::new(Some(on_throw));
        let failures: Mutex<Vec<anyhow::Error>> = Mutex::new(Vec::new());

        // Records a failure, then gives the peer its one chance to react.
        let record = |error: anyhow::Error| {
            failures.lock().push(error);
            let handler = on_throw.lock().take();
            if let Some(handler) = handler {
                handler();
            }
        };

        let outcome = std::thread::scope(|scope| {
            let background_task = move || match background() {
                Ok(value) => Some(value),
                Err(e) => {
                    record(e);
                    None
                }
            };

            let handle = std::thread::Builder::new()
                .name(format!("{}-bg", self.name))
                .spawn_scoped(scope, background_task)?;

            let foreground_value = match foreground() {
                Ok(value) => Some(value),
                Err(e) => {
                    record(e);
                    None
                }
            };

            let background_value = match handle.join() {
                Ok(value) => value,
                Err(payload) => {
                    record(anyhow!(
                        "{} background thread panicked: {}",
                        self.name,
                        panic_message(&*payload)
                    ));
                    None
                }
            };

            Ok::<_, std::io::Error>((foreground_value, background_value))
        });

        let (foreground_value, background_value) = match outcome {
            Ok(values) => values,
            Err(e) => {
                return Err(ParallelExecutionError {
                    cause: anyhow!("{} could not spawn background thread: {}", self.name, e),
                    suppressed: None,
                })
            }
        };

        let mut failures = failures.into_inner().into_iter();
        match (foreground_value, background_value, failures.next()) {
            (Some(t), Some(u), None) => Ok((t, u)),
            (_, _, Some(cause)) => {
                let suppressed = failures.next();
                debug!(
                    executor = %self.name,
                    cause = %cause,
                    suppressed = suppressed.is_some(),
                    "Parallel execution failed"
                );
                Err(ParallelExecutionError { cause, suppressed })
            }
            _ => Err(ParallelExecutionError {
                cause: anyhow!("{} produced no result", self.name),
                suppressed: None,
            }),
        }
    }
}
