//! Download pipeline: runs one task's URLs in order.
//!
//! Each URL gets its own timeout-bounded GET; the response body is streamed
//! straight into the [`Storage`] collaborator. The first failing URL fails the
//! whole task and no later URL is attempted. Cancellation is observed before
//! and during every URL, so a shutdown never waits for more than the in-flight
//! request to be dropped.

use std::sync::Arc;
use std::time::Duration;

use futures::TryStreamExt;
use tokio::sync::broadcast;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::DownloadError;
use crate::storage::Storage;
use crate::store::TaskStore;
use crate::types::{Event, Task, TaskId};

/// How a single pipeline run ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every URL was saved; the task is Completed
    Completed,
    /// A URL failed; the task is Failed
    Failed,
    /// Cancellation arrived mid-run; the task is left Running
    Interrupted,
    /// The task could not be picked up (unknown id or not Pending)
    Skipped,
}

/// Parse a submitted URL and derive the storage name from its final path segment.
///
/// Only absolute `http`/`https` URLs whose last path segment is non-empty are
/// accepted.
pub fn parse_download_url(raw: &str) -> Result<(Url, String), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{other}'")),
    }

    let name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| "URL path has no file name".to_string())?;

    Ok((url, name))
}

/// Executes tasks against an HTTP client and a storage backend
pub struct DownloadPipeline {
    client: reqwest::Client,
    storage: Arc<dyn Storage>,
    store: Arc<TaskStore>,
    file_timeout: Duration,
    event_tx: broadcast::Sender<Event>,
}

impl DownloadPipeline {
    /// Create a pipeline that writes through `storage` and records status in `store`
    pub fn new(
        store: Arc<TaskStore>,
        storage: Arc<dyn Storage>,
        file_timeout: Duration,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            storage,
            store,
            file_timeout,
            event_tx,
        }
    }

    /// Run the task with the given id to its end.
    ///
    /// The task's completion fires exactly once for every run that moved the
    /// task to Running, whatever the outcome. A run that cannot pick the task
    /// up (already taken by another worker, or unknown) is skipped and leaves
    /// the completion alone.
    pub async fn process(&self, id: &TaskId, cancel: &CancellationToken) -> RunOutcome {
        let Some(completion) = self.store.completion(id).await else {
            tracing::warn!(task_id = %id, "Queued task no longer exists, skipping");
            return RunOutcome::Skipped;
        };

        let task = match self.store.mark_running(id).await {
            Ok(task) => task,
            Err(e) => {
                tracing::warn!(task_id = %id, error = %e, "Task cannot be started, skipping");
                return RunOutcome::Skipped;
            }
        };

        tracing::info!(task_id = %id, urls = task.urls.len(), "Task started");
        self.event_tx
            .send(Event::TaskStarted { id: id.clone() })
            .ok();

        let outcome = self.run(&task, cancel).await;

        if !completion.complete() {
            tracing::warn!(task_id = %id, "Completion signal was already fired");
        }
        outcome
    }

    async fn run(&self, task: &Task, cancel: &CancellationToken) -> RunOutcome {
        let id = &task.id;

        for url in &task.urls {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.fetch(url) => Some(result),
            };

            match result {
                None => {
                    tracing::info!(task_id = %id, url = %url, "Task interrupted by shutdown");
                    self.event_tx
                        .send(Event::TaskInterrupted { id: id.clone() })
                        .ok();
                    return RunOutcome::Interrupted;
                }
                Some(Ok(bytes)) => {
                    tracing::debug!(task_id = %id, url = %url, bytes, "URL downloaded");
                }
                Some(Err(e)) => {
                    let message = e.to_string();
                    tracing::warn!(task_id = %id, url = %url, error = %message, "Task failed");

                    if let Err(e) = self.store.mark_failed(id, message.clone()).await {
                        tracing::error!(task_id = %id, error = %e, "Failed to record task failure");
                    }
                    self.event_tx
                        .send(Event::TaskFailed {
                            id: id.clone(),
                            url: url.clone(),
                            error: message,
                        })
                        .ok();
                    return RunOutcome::Failed;
                }
            }
        }

        if let Err(e) = self.store.mark_completed(id).await {
            tracing::error!(task_id = %id, error = %e, "Failed to record task completion");
        }
        tracing::info!(task_id = %id, "Task completed");
        self.event_tx
            .send(Event::TaskCompleted { id: id.clone() })
            .ok();
        RunOutcome::Completed
    }

    /// Download one URL into storage, bounded by the per-file timeout
    async fn fetch(&self, raw: &str) -> Result<u64, DownloadError> {
        let (url, name) =
            parse_download_url(raw).map_err(|reason| DownloadError::InvalidRequest {
                url: raw.to_string(),
                reason,
            })?;

        tokio::time::timeout(self.file_timeout, self.fetch_into_storage(raw, url, &name))
            .await
            .map_err(|_| DownloadError::Timeout {
                url: raw.to_string(),
                timeout: self.file_timeout,
            })?
    }

    async fn fetch_into_storage(&self, raw: &str, url: Url, name: &str) -> Result<u64, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| DownloadError::Transport {
                url: raw.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                url: raw.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes_stream().map_err(std::io::Error::other);
        let mut reader = StreamReader::new(Box::pin(body));

        self.storage
            .save(name, &mut reader)
            .await
            .map_err(|source| DownloadError::Storage {
                name: name.to_string(),
                source,
            })
    }
}
