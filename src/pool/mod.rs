//! Worker pool: a fixed number of workers draining one bounded queue.
//!
//! Split into focused submodules:
//! - [`pipeline`] - Per-task download pipeline run by each worker
//!
//! Submission blocks while the queue is full. Every worker loop waits on the
//! queue and the pool's cancellation token at the same time; once the token is
//! cancelled the loops exit after their current pipeline run observes it.

pub mod pipeline;

use std::sync::{Arc, PoisonError};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::types::TaskId;

pub use pipeline::{DownloadPipeline, RunOutcome};

/// Bounded queue plus W worker loops running the [`DownloadPipeline`]
pub struct WorkerPool {
    pipeline: Arc<DownloadPipeline>,
    num_workers: usize,
    sender: mpsc::Sender<TaskId>,
    receiver: Arc<Mutex<mpsc::Receiver<TaskId>>>,
    /// Cancelled by [`close`](Self::close); releases blocked submitters
    closed: CancellationToken,
    workers: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Create a pool of `num_workers` workers sharing a queue of `queue_size` slots.
    ///
    /// Both values must be non-zero (see [`Config::validate`](crate::config::Config::validate)).
    pub fn new(pipeline: Arc<DownloadPipeline>, num_workers: usize, queue_size: usize) -> Self {
        let (sender, receiver) = mpsc::channel(queue_size.max(1));
        Self {
            pipeline,
            num_workers: num_workers.max(1),
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            closed: CancellationToken::new(),
            workers: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Launch the worker loops; they run until `cancel` fires.
    ///
    /// Calling `start` on a pool that is already running is a no-op.
    pub fn start(&self, cancel: CancellationToken) {
        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        if !workers.is_empty() {
            tracing::warn!("Worker pool already started");
            return;
        }

        for worker_id in 0..self.num_workers {
            let pipeline = Arc::clone(&self.pipeline);
            let receiver = Arc::clone(&self.receiver);
            let cancel = cancel.clone();

            workers.push(tokio::spawn(async move {
                worker_loop(worker_id, pipeline, receiver, cancel).await;
            }));
        }

        tracing::info!(workers = self.num_workers, "Worker pool started");
    }

    /// Queue a task for processing.
    ///
    /// Waits for a free slot when the queue is full. Fails with
    /// [`Error::ShuttingDown`] once [`close`](Self::close) has been called,
    /// including for a submitter that was still waiting for a slot.
    pub async fn submit(&self, id: TaskId) -> Result<()> {
        if !self.is_accepting() {
            return Err(Error::ShuttingDown);
        }

        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(Error::ShuttingDown),
            sent = self.sender.send(id) => sent.map_err(|_| Error::ShuttingDown),
        }
    }

    /// Queue a task only if a slot is free right now
    pub fn try_submit(&self, id: TaskId) -> Result<bool> {
        if !self.is_accepting() {
            return Err(Error::ShuttingDown);
        }

        match self.sender.try_send(id) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(_)) => Ok(false),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(Error::ShuttingDown),
        }
    }

    /// Stop accepting submissions
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Whether [`submit`](Self::submit) still accepts tasks
    pub fn is_accepting(&self) -> bool {
        !self.closed.is_cancelled()
    }

    /// Number of queued tasks not yet picked up by a worker
    pub fn queued(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Wait until every worker loop has exited
    pub async fn wait(&self) {
        let handles = {
            let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *workers)
        };

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker task panicked");
            }
        }

        tracing::info!("Worker pool stopped");
    }
}

async fn worker_loop(
    worker_id: usize,
    pipeline: Arc<DownloadPipeline>,
    receiver: Arc<Mutex<mpsc::Receiver<TaskId>>>,
    cancel: CancellationToken,
) {
    tracing::debug!(worker_id, "Worker started");

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            id = async { receiver.lock().await.recv().await } => id,
        };

        let Some(id) = next else {
            break;
        };

        tracing::debug!(worker_id, task_id = %id, "Worker picked up task");
        pipeline.process(&id, &cancel).await;
    }

    tracing::debug!(worker_id, "Worker exited");
}
