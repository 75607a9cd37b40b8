//! One-shot completion signal for a task.
//!
//! Every task carries a [`Completion`]. The worker that processes the task
//! fires it exactly once when processing ends, whatever the outcome. Any number
//! of callers may wait on it, before or after it fires.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable handle to a task's completion signal
#[derive(Clone, Debug)]
pub struct Completion {
    tx: Arc<watch::Sender<bool>>,
}

impl Completion {
    /// Create an unfired signal
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Create a signal that has already fired (restored terminal tasks)
    pub fn fired() -> Self {
        let signal = Self::new();
        signal.complete();
        signal
    }

    /// Fire the signal.
    ///
    /// Returns `true` only for the call that actually fired it; every later
    /// call is a no-op returning `false`.
    pub fn complete(&self) -> bool {
        self.tx.send_if_modified(|done| {
            if *done {
                false
            } else {
                *done = true;
                true
            }
        })
    }

    /// Whether the signal has fired
    pub fn is_complete(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the signal fires (returns immediately if it already has)
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|done| *done).await;
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}
