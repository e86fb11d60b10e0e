//! Cooperative cancellation.
//!
//! A `CancellationToken` is a flag plus a channel that disconnects when the
//! token is cancelled. Workers blocked in `crossbeam_channel::select!` wake up
//! through `receiver()`; workers in a compute loop poll `is_cancelled()`.

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    // Dropped on cancel; nothing is ever sent.
    signal: Mutex<Option<Sender<()>>>,
    receiver: Receiver<()>,
}

/// Shared, cloneable cancellation signal.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (signal, receiver) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                signal: Mutex::new(Some(signal)),
                receiver,
            }),
        }
    }

    /// Cancel. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.signal.lock().take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// A receiver that becomes ready (disconnected) once the token is cancelled.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.inner.receiver
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
