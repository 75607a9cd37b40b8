//! Task manager split into focused submodules.
//!
//! The `TaskManager` struct wires the store, the worker pool and the event
//! channel together. Its methods are organized by domain:
//! - [`tasks`] - Task submission and queries
//! - [`lifecycle`] - Snapshot restore, pool startup and shutdown
//! - [`server`] - REST API spawning

mod lifecycle;
mod server;
mod tasks;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use tasks::validate_urls;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::Result;
use crate::pool::{DownloadPipeline, WorkerPool};
use crate::storage::{LocalStorage, Storage};
use crate::store::TaskStore;
use crate::types::Event;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Main task manager instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct TaskManager {
    /// Every task known to this process
    pub(crate) store: Arc<TaskStore>,
    /// Bounded queue and workers running the download pipeline
    pub(crate) pool: Arc<WorkerPool>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Top-level cancellation signal observed by workers and the API server
    pub(crate) cancel: CancellationToken,
    /// Set once [`start`](Self::start) has restored the store
    pub(crate) started: Arc<AtomicBool>,
}

impl TaskManager {
    /// Create a new TaskManager writing downloads into `storage.downloads_dir`
    ///
    /// The configuration is validated first. No task is loaded and no worker
    /// runs until [`start`](Self::start) is called.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let storage = LocalStorage::new(config.storage.downloads_dir.clone());
        Ok(Self::with_storage(config, Arc::new(storage)))
    }

    /// Create a TaskManager with a custom storage backend
    pub fn with_storage(config: Config, storage: Arc<dyn Storage>) -> Self {
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let store = Arc::new(TaskStore::new());

        let pipeline = Arc::new(DownloadPipeline::new(
            Arc::clone(&store),
            storage,
            config.worker_pool.file_timeout,
            event_tx.clone(),
        ));
        let pool = Arc::new(WorkerPool::new(
            pipeline,
            config.worker_pool.num_workers,
            config.worker_pool.task_queue_size,
        ));

        Self {
            store,
            pool,
            event_tx,
            config: Arc::new(config),
            cancel: CancellationToken::new(),
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to task events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// A subscriber that falls behind by more than the channel capacity receives
    /// `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Token cancelled when shutdown begins
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Emit an event to all subscribers (dropped if nobody is listening)
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
