//! Core types for batch-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a task
///
/// IDs are ULIDs rendered in their canonical 26-character form. They are
/// opaque to callers: equality is the only meaningful operation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh, unique TaskId
    pub fn generate() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task lifecycle status
///
/// Transitions only along `Pending -> Running -> {Completed, Failed}`.
/// Completed and Failed are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Created (or restored) and waiting for a worker
    Pending,
    /// Picked up by a worker, URLs being downloaded
    Running,
    /// Every URL was saved
    Completed,
    /// A URL failed; no further URLs were attempted
    Failed,
}

impl Status {
    /// Rendered form used in snapshots and API responses
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Running => "running",
            Status::Completed => "completed",
            Status::Failed => "failed",
        }
    }

    /// Whether no further transition is allowed from this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }

    /// Whether the pipeline may move a task from `self` to `next`
    pub fn can_transition_to(&self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Pending, Status::Running)
                | (Status::Running, Status::Completed)
                | (Status::Running, Status::Failed)
        )
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "running" => Ok(Status::Running),
            "completed" => Ok(Status::Completed),
            "failed" => Ok(Status::Failed),
            other => Err(format!("unknown task status '{other}'")),
        }
    }
}

/// A download task as seen by callers outside the store
///
/// This is always a copy taken under the store's lock; mutating it has no
/// effect on the stored task. Its serialized form is also the snapshot record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    /// Unique task ID, assigned at creation
    pub id: TaskId,
    /// URLs to download, in order
    pub urls: Vec<String>,
    /// Current lifecycle status
    pub status: Status,
    /// When the task was created
    pub created_at: DateTime<Utc>,
    /// When the task last changed status
    pub updated_at: DateTime<Utc>,
    /// Failure message, present only when `status == failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Task {
    /// Create a new Pending task stamped with the current time
    pub fn new(urls: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::generate(),
            urls,
            status: Status::Pending,
            created_at: now,
            updated_at: now,
            error: None,
        }
    }

    /// Advance `updated_at` to now without ever moving it backwards
    pub(crate) fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

/// Event emitted during the task lifecycle
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task created and queued
    TaskCreated {
        /// Task ID
        id: TaskId,
        /// Number of URLs in the task
        url_count: usize,
    },

    /// A worker started processing the task
    TaskStarted {
        /// Task ID
        id: TaskId,
    },

    /// All URLs were saved
    TaskCompleted {
        /// Task ID
        id: TaskId,
    },

    /// A URL failed and processing stopped
    TaskFailed {
        /// Task ID
        id: TaskId,
        /// URL that failed
        url: String,
        /// Error message
        error: String,
    },

    /// Processing stopped early because the pool is shutting down
    TaskInterrupted {
        /// Task ID
        id: TaskId,
    },

    /// Service is shutting down
    Shutdown,
}

impl Event {
    /// Event name used for the SSE `event:` field
    pub fn name(&self) -> &'static str {
        match self {
            Event::TaskCreated { .. } => "task_created",
            Event::TaskStarted { .. } => "task_started",
            Event::TaskCompleted { .. } => "task_completed",
            Event::TaskFailed { .. } => "task_failed",
            Event::TaskInterrupted { .. } => "task_interrupted",
            Event::Shutdown => "shutdown",
        }
    }
}
