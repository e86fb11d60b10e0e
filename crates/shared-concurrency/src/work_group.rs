//! Named fixed-size worker pool for one logical unit of work.
//!
//! Tasks receive the group's `CancellationToken`. The first task that fails
//! (returns a non-interruption error or panics) aborts the whole group:
//! `has_exceptions()` flips, the abort callback fires once, the exception
//! listener gets a chance to claim the error, and the token is cancelled so
//! every other task can stop. Failures after the first are logged and dropped.

use crate::cancellation::CancellationToken;
use crate::error::WorkGroupError;
use crate::{is_interruption, panic_message};
use anyhow::anyhow;
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, warn};

type Task = Box<dyn FnOnce(&CancellationToken) -> anyhow::Result<()> + Send + 'static>;
type AbortCallback = Box<dyn FnOnce() + Send + 'static>;
/// Returns `true` if it handled (and reported) the error itself.
type ExceptionListener = Box<dyn Fn(&anyhow::Error) -> bool + Send + Sync + 'static>;

struct Shared {
    name: String,
    token: CancellationToken,
    has_exceptions: AtomicBool,
    first_error: Mutex<Option<anyhow::Error>>,
    on_abort: Mutex<Option<AbortCallback>>,
    listener: Option<ExceptionListener>,
}

impl Shared {
    fn handle_failure(&self, failure: anyhow::Error) {
        if self.has_exceptions.swap(true, Ordering::SeqCst) {
            warn!(
                group = %self.name,
                error = %failure,
                "[work-group] Additional task failure after abort"
            );
            return;
        }

        let on_abort = self.on_abort.lock().take();
        if let Some(on_abort) = on_abort {
            on_abort();
        }

        let handled = self.listener.as_ref().is_some_and(|listener| listener(&failure));
        if !handled {
            error!(
                group = %self.name,
                error = %failure,
                "[work-group] Task failed, aborting group"
            );
        }

        *self.first_error.lock() = Some(failure);
        self.token.cancel();
    }
}

fn worker_loop(shared: Arc<Shared>, tasks: Receiver<Task>) {
    loop {
        let task = select! {
            recv(tasks) -> msg => match msg {
                Ok(task) => task,
                Err(_) => return,
            },
            recv(shared.token.receiver()) -> _ => return,
        };
        if shared.token.is_cancelled() {
            return;
        }

        let failure = match panic::catch_unwind(AssertUnwindSafe(|| task(&shared.token))) {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => e,
            Err(payload) => anyhow!("task panicked: {}", panic_message(&*payload)),
        };

        if is_interruption(&failure) {
            debug!(group = %shared.name, "[work-group] Task interrupted");
            continue;
        }
        shared.handle_failure(failure);
    }
}

/// Configures and starts a `StandardWorkGroup`.
pub struct WorkGroupBuilder {
    name: String,
    threads: usize,
    on_abort: Option<AbortCallback>,
    listener: Option<ExceptionListener>,
}

impl WorkGroupBuilder {
    /// Number of worker threads. Clamped to at least one.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Runs once, on the thread of the first failing task.
    pub fn on_abort(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_abort = Some(Box::new(callback));
        self
    }

    /// Sees the first failure. Returning `true` suppresses the group's own error log.
    pub fn exception_listener(
        mut self,
        listener: impl Fn(&anyhow::Error) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Spawn the workers.
    ///
    /// # Errors
    /// `WorkGroupError::Spawn` if a worker thread could not be created. Workers
    /// that did start are stopped before returning.
    pub fn build(self) -> Result<StandardWorkGroup, WorkGroupError> {
        let shared = Arc::new(Shared {
            name: self.name.clone(),
            token: CancellationToken::new(),
            has_exceptions: AtomicBool::new(false),
            first_error: Mutex::new(None),
            on_abort: Mutex::new(self.on_abort),
            listener: self.listener,
        });
        let (sender, receiver) = unbounded::<Task>();

        let mut workers = Vec::with_capacity(self.threads);
        for index in 0..self.threads {
            let worker_shared = Arc::clone(&shared);
            let worker_tasks = receiver.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("{}-{}", self.name, index))
                .spawn(move || worker_loop(worker_shared, worker_tasks));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    shared.token.cancel();
                    drop(sender);
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(WorkGroupError::Spawn {
                        group: self.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(group = %self.name, threads = self.threads, "[work-group] Started");
        Ok(StandardWorkGroup {
            shared,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        })
    }
}

/// Fixed-size pool running the tasks of one logical unit of work.
pub struct StandardWorkGroup {
    shared: Arc<Shared>,
    sender: Mutex<Option<Sender<Task>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for StandardWorkGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardWorkGroup")
            .field("name", &self.shared.name)
            .field("has_exceptions", &self.has_exceptions())
            .field("is_shut_down", &self.is_shut_down())
            .finish()
    }
}

impl StandardWorkGroup {
    /// Builder defaulting to one thread per available CPU.
    pub fn builder(name: impl Into<String>) -> WorkGroupBuilder {
        WorkGroupBuilder {
            name: name.into(),
            threads: num_cpus::get().max(1),
            on_abort: None,
            listener: None,
        }
    }

    /// Start a group with `threads` workers and no callbacks.
    pub fn new(name: impl Into<String>, threads: usize) -> Result<Self, WorkGroupError> {
        Self::builder(name).threads(threads).build()
    }

    /// Start a group with one worker per available CPU.
    pub fn with_default_threads(name: impl Into<String>) -> Result<Self, WorkGroupError> {
        Self::builder(name).build()
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Submit a task.
    ///
    /// # Errors
    /// `WorkGroupError::ShutDown` once the group was aborted or intake closed.
    pub fn execute<F>(&self, task: F) -> Result<(), WorkGroupError>
    where
        F: FnOnce(&CancellationToken) -> anyhow::Result<()> + Send + 'static,
    {
        let shut_down = || WorkGroupError::ShutDown {
            group: self.shared.name.clone(),
        };
        if self.shared.token.is_cancelled() {
            return Err(shut_down());
        }
        let sender = self.sender.lock();
        match sender.as_ref() {
            Some(sender) => sender.send(Box::new(task)).map_err(|_| shut_down()),
            None => Err(shut_down()),
        }
    }

    /// True once any task has failed.
    pub fn has_exceptions(&self) -> bool {
        self.shared.has_exceptions.load(Ordering::SeqCst)
    }

    /// True once the group stopped accepting tasks.
    pub fn is_shut_down(&self) -> bool {
        self.shared.token.is_cancelled() || self.sender.lock().is_none()
    }

    /// The token handed to every task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shared.token.clone()
    }

    /// Hard shutdown: cancel the token. Queued tasks are discarded.
    pub fn abort(&self) {
        self.shared.token.cancel();
        self.sender.lock().take();
    }

    /// Close intake and block until every worker exits.
    ///
    /// Without an abort, queued tasks run to completion first.
    ///
    /// # Errors
    /// `WorkGroupError::TaskFailed` with the first failure if the group aborted.
    pub fn wait_for_termination(&self) -> Result<(), WorkGroupError> {
        self.sender.lock().take();
        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in workers {
            if handle.join().is_err() {
                warn!(group = %self.shared.name, "[work-group] Worker thread panicked");
            }
        }

        if self.has_exceptions() {
            let source = self
                .shared
                .first_error
                .lock()
                .take()
                .unwrap_or_else(|| anyhow!("failure already reported"));
            return Err(WorkGroupError::TaskFailed {
                group: self.shared.name.clone(),
                source,
            });
        }
        Ok(())
    }
}

impl Drop for StandardWorkGroup {
    fn drop(&mut self) {
        self.sender.get_mut().take();
        for handle in self.workers.get_mut().drain(..) {
            let _ = handle.join();
        }
    }
}
