//! Startup and shutdown coordination.

use std::sync::atomic::Ordering;

use crate::error::{Error, Result};
use crate::types::{Event, Status};

use super::TaskManager;

impl TaskManager {
    /// Restore the snapshot, start the workers and re-queue unfinished tasks
    ///
    /// Returns the number of tasks re-queued. A snapshot that exists but
    /// cannot be read or decoded aborts startup with [`Error::Persistence`]
    /// before any worker runs; `start` may then be called again.
    ///
    /// Once startup has succeeded, later calls are no-ops returning `Ok(0)`:
    /// the live store is never replaced by the snapshot while workers run.
    pub async fn start(&self) -> Result<usize> {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::warn!("Task manager already started");
            return Ok(0);
        }

        let path = &self.config.tasks.file;
        let loaded = match self.store.load(path).await {
            Ok(loaded) => loaded,
            Err(e) => {
                self.started.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };
        tracing::info!(path = %path.display(), tasks = loaded, "Task store restored");

        self.pool.start(self.cancel.clone());

        self.resubmit_unfinished().await
    }

    /// Queue every Pending (or Running) task again, oldest first
    async fn resubmit_unfinished(&self) -> Result<usize> {
        let unfinished: Vec<_> = self
            .list_tasks()
            .await
            .into_iter()
            .filter(|task| matches!(task.status, Status::Pending | Status::Running))
            .collect();

        for task in &unfinished {
            tracing::debug!(task_id = %task.id, "Re-queueing restored task");
            self.pool.submit(task.id.clone()).await?;
        }

        if !unfinished.is_empty() {
            tracing::info!(count = unfinished.len(), "Re-queued unfinished tasks");
        }
        Ok(unfinished.len())
    }

    /// Gracefully shut down the manager
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new tasks
    /// 2. Cancels workers (in-flight downloads are abandoned, their tasks stay Running)
    /// 3. Waits for every worker to exit
    /// 4. Writes the task snapshot (Running tasks are saved as Pending)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the snapshot cannot be written. The
    /// in-memory store is unaffected.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new tasks
        self.pool.close();
        tracing::info!("Stopped accepting new tasks");

        // 2. Signal cancellation to workers and the API server
        self.cancel.cancel();

        // 3. Wait for workers to observe it
        self.pool.wait().await;

        // 4. Persist final state
        let saved = self.save_snapshot().await;

        self.emit_event(Event::Shutdown);

        match saved {
            Ok(count) => {
                tracing::info!(tasks = count, "Graceful shutdown complete");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to save task snapshot during shutdown");
                Err(e)
            }
        }
    }

    /// Write the task snapshot to the configured file
    pub async fn save_snapshot(&self) -> Result<usize> {
        self.store
            .save(&self.config.tasks.file)
            .await
            .map_err(Error::from)
    }

    /// Whether new tasks are still accepted
    pub fn is_accepting(&self) -> bool {
        self.pool.is_accepting()
    }
}
