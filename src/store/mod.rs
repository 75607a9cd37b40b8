//! In-memory task store.
//!
//! [`TaskStore`] owns the id → task map. All structural changes (create, load)
//! take the write lock; reads take the read lock and hand out copies, never
//! references to the stored task. Status changes go through the store as
//! well, which validates them against the task state machine.
//!
//! - [`snapshot`] - Snapshot codec used by [`TaskStore::save`] / [`TaskStore::load`]

pub mod snapshot;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

use tokio::sync::{Mutex, RwLock};

use crate::completion::Completion;
use crate::error::{Error, PersistenceError, Result};
use crate::types::{Status, Task, TaskId};

/// A stored task plus its completion signal
#[derive(Debug)]
struct TaskRecord {
    task: Task,
    completion: Completion,
}

impl TaskRecord {
    fn new(task: Task) -> Self {
        let completion = if task.status.is_terminal() {
            Completion::fired()
        } else {
            Completion::new()
        };
        Self { task, completion }
    }
}

/// Owns every task known to the process
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: RwLock<HashMap<TaskId, TaskRecord>>,
    /// Serializes snapshot writers so two saves never share the temp file
    save_lock: Mutex<()>,
}

impl TaskStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a Pending task for `urls` and return a copy of it
    pub async fn create(&self, urls: Vec<String>) -> Task {
        let mut tasks = self.tasks.write().await;
        loop {
            let task = Task::new(urls.clone());
            if let Entry::Vacant(slot) = tasks.entry(task.id.clone()) {
                slot.insert(TaskRecord::new(task.clone()));
                return task;
            }
            // ULID collision: retry with a fresh id
        }
    }

    /// Get a copy of a task
    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        let tasks = self.tasks.read().await;
        tasks.get(id).map(|r| r.task.clone())
    }

    /// Get copies of all tasks (unspecified order)
    pub async fn list(&self) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        tasks.values().map(|r| r.task.clone()).collect()
    }

    /// Number of tasks in the store
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Whether the store holds no tasks
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Get the completion signal of a task
    pub async fn completion(&self, id: &TaskId) -> Option<Completion> {
        let tasks = self.tasks.read().await;
        tasks.get(id).map(|r| r.completion.clone())
    }

    /// Pending → Running (a worker picked the task up)
    pub(crate) async fn mark_running(&self, id: &TaskId) -> Result<Task> {
        self.transition(id, Status::Running, None).await
    }

    /// Running → Completed
    pub(crate) async fn mark_completed(&self, id: &TaskId) -> Result<Task> {
        self.transition(id, Status::Completed, None).await
    }

    /// Running → Failed, recording the error message
    pub(crate) async fn mark_failed(&self, id: &TaskId, error: String) -> Result<Task> {
        self.transition(id, Status::Failed, Some(error)).await
    }

    async fn transition(&self, id: &TaskId, next: Status, error: Option<String>) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        let record = tasks
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;

        let current = record.task.status;
        if !current.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                id: id.clone(),
                from: current,
                to: next,
            });
        }

        record.task.status = next;
        record.task.error = error;
        record.task.touch();
        Ok(record.task.clone())
    }

    /// Write a snapshot of every task to `path`.
    ///
    /// Running tasks are written as Pending with no error (see [`snapshot::sanitize`]).
    /// The in-memory store is never modified.
    pub async fn save(&self, path: &Path) -> std::result::Result<usize, PersistenceError> {
        let _writer = self.save_lock.lock().await;

        let tasks = self.list().await;
        let count = tasks.len();
        let bytes = snapshot::encode(tasks).map_err(PersistenceError::Encode)?;
        snapshot::write_atomic(path, &bytes).await?;

        tracing::debug!(path = %path.display(), count, "Saved task snapshot");
        Ok(count)
    }

    /// Replace the store's contents with the snapshot at `path`.
    ///
    /// A missing or empty file yields an empty store. Malformed content is an
    /// error and leaves the current contents untouched. A record still marked
    /// `running` is restored as `pending`.
    pub async fn load(&self, path: &Path) -> std::result::Result<usize, PersistenceError> {
        let decoded = match snapshot::read(path).await? {
            Some(bytes) => {
                snapshot::decode(&bytes).map_err(|source| PersistenceError::Decode {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => {
                tracing::info!(path = %path.display(), "No task snapshot found, starting empty");
                Vec::new()
            }
        };

        let mut restored = HashMap::with_capacity(decoded.len());
        for task in decoded {
            if task.status == Status::Running {
                tracing::warn!(
                    task_id = %task.id,
                    "Snapshot holds a running task, restoring it as pending"
                );
            }
            let task = snapshot::sanitize(task);
            match restored.entry(task.id.clone()) {
                Entry::Occupied(_) => {
                    return Err(PersistenceError::DuplicateId {
                        path: path.to_path_buf(),
                        id: task.id,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(TaskRecord::new(task));
                }
            }
        }

        let count = restored.len();
        *self.tasks.write().await = restored;

        tracing::info!(path = %path.display(), count, "Loaded task snapshot");
        Ok(count)
    }
}
