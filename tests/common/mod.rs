//! Common test utilities for batch-dl end-to-end tests

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use batch_dl::{Config, Event, Task, TaskId, TaskManager};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Result of waiting for a task to finish
#[derive(Debug)]
pub enum WaitResult {
    /// Task completed successfully
    Completed,
    /// Task failed with error
    Failed(String),
    /// Timeout waiting for a terminal event
    Timeout,
    /// Channel closed unexpectedly
    ChannelClosed,
}

/// Config with every path inside `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.storage.downloads_dir = dir.join("downloads");
    config.tasks.file = dir.join("tasks.json");
    config.worker_pool.num_workers = 2;
    config.worker_pool.task_queue_size = 16;
    config.worker_pool.file_timeout = Duration::from_secs(10);
    config
}

/// A started manager writing into a fresh temp dir
pub async fn started_manager() -> (TaskManager, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let manager = started_manager_in(temp_dir.path()).await;
    (manager, temp_dir)
}

/// A started manager over an existing directory (for restart scenarios)
pub async fn started_manager_in(dir: &Path) -> TaskManager {
    let manager = TaskManager::new(test_config(dir)).unwrap();
    manager.start().await.unwrap();
    manager
}

/// Mount a 200 response with `body` at `/name`
pub async fn serve(server: &MockServer, name: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mount a 200 response at `/name` that takes `delay` to arrive
pub async fn serve_slowly(server: &MockServer, name: &str, body: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(format!("/{name}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Mount a bare status response at `/name`
pub async fn respond_with_status(server: &MockServer, name: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/{name}")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub fn url(server: &MockServer, name: &str) -> String {
    format!("{}/{name}", server.uri())
}

/// Wait for the terminal event of task `id`
///
/// Subscribe before the task can finish, or the event may be missed.
pub async fn wait_for_terminal_event(
    events: &mut tokio::sync::broadcast::Receiver<Event>,
    id: &TaskId,
    timeout: Duration,
) -> WaitResult {
    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(Event::TaskCompleted { id: event_id }) if &event_id == id => {
                    return WaitResult::Completed;
                }
                Ok(Event::TaskFailed {
                    id: event_id,
                    error,
                    ..
                }) if &event_id == id => {
                    return WaitResult::Failed(error);
                }
                Ok(_) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(_) => return WaitResult::ChannelClosed,
            }
        }
    })
    .await;

    result.unwrap_or(WaitResult::Timeout)
}

/// Poll until the task leaves Pending
pub async fn wait_until_started(manager: &TaskManager, id: &TaskId) -> Task {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let task = manager.get_task(id).await.unwrap();
            if task.status != batch_dl::Status::Pending {
                return task;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("task never started")
}
