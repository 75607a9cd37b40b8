//! Task submission and queries.

use crate::error::{Error, Result};
use crate::pool::pipeline::parse_download_url;
use crate::types::{Event, Task, TaskId};

use super::TaskManager;

/// Check a submitted URL list before any task is created.
///
/// The list must be non-empty, and every URL must be an absolute `http`/`https`
/// URL whose final path segment can serve as a file name.
pub fn validate_urls(urls: &[String]) -> Result<()> {
    if urls.is_empty() {
        return Err(Error::Validation("task must contain at least one URL".to_string()));
    }

    for (index, url) in urls.iter().enumerate() {
        parse_download_url(url)
            .map_err(|reason| Error::Validation(format!("urls[{index}] '{url}': {reason}")))?;
    }
    Ok(())
}

impl TaskManager {
    /// Create a Pending task for `urls` and queue it for processing
    ///
    /// Waits for a queue slot if the queue is full.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the URL list is empty or a URL is unusable
    /// - [`Error::ShuttingDown`] once shutdown has begun
    pub async fn create_task(&self, urls: Vec<String>) -> Result<Task> {
        if !self.pool.is_accepting() {
            return Err(Error::ShuttingDown);
        }
        validate_urls(&urls)?;

        let task = self.store.create(urls).await;
        tracing::info!(task_id = %task.id, urls = task.urls.len(), "Task created");

        if let Err(e) = self.pool.submit(task.id.clone()).await {
            // Stays Pending in the store and is re-queued on the next start
            tracing::warn!(task_id = %task.id, error = %e, "Task created but not queued");
            return Err(e);
        }

        self.emit_event(Event::TaskCreated {
            id: task.id.clone(),
            url_count: task.urls.len(),
        });
        Ok(task)
    }

    /// Get a copy of a task
    pub async fn get_task(&self, id: &TaskId) -> Result<Task> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| Error::NotFound(id.clone()))
    }

    /// Get copies of all tasks, oldest first
    pub async fn list_tasks(&self) -> Vec<Task> {
        let mut tasks = self.store.list().await;
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        tasks
    }

    /// Wait until the task's current run ends, then return its state
    ///
    /// Returns immediately for tasks that are already Completed or Failed.
    pub async fn wait_for_task(&self, id: &TaskId) -> Result<Task> {
        let completion = self
            .store
            .completion(id)
            .await
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        completion.wait().await;
        self.get_task(id).await
    }
}
