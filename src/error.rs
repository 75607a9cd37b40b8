//! Error types for batch-dl
//!
//! This module provides the error taxonomy for the library:
//! - Submission errors (validation of URL lists)
//! - Per-URL download errors (transport and storage), captured into the
//!   failed task's `error` text and never returned as an [`Error`]
//! - Snapshot persistence errors (I/O vs. malformed content)
//! - HTTP status code mapping and structured error bodies for the REST API

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{Status, TaskId};

/// Result type alias for batch-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for batch-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "worker_pool.num_workers")
        key: Option<String>,
    },

    /// Submitted URL list is empty or malformed
    #[error("validation error: {0}")]
    Validation(String),

    /// Snapshot could not be read, decoded or written
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Task not found
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A status change that the task state machine does not allow
    #[error("task {id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// The task whose status change was rejected
        id: TaskId,
        /// Current status
        from: Status,
        /// Requested status
        to: Status,
    },

    /// Shutdown in progress - not accepting new tasks
    #[error("shutdown in progress: not accepting new tasks")]
    ShuttingDown,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Failure of one URL inside a task's pipeline
///
/// These never escape the pipeline: the rendered message is stored in the
/// task's `error` field and the task is marked failed.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// URL could not be turned into a request
    #[error("invalid request for {url}: {reason}")]
    InvalidRequest {
        /// The offending URL
        url: String,
        /// Why no request could be built
        reason: String,
    },

    /// Network or protocol failure
    #[error("request to {url} failed: {source}")]
    Transport {
        /// The URL being fetched
        url: String,
        /// Underlying client error
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    HttpStatus {
        /// The URL being fetched
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Per-file timeout elapsed
    #[error("timed out after {}s downloading {url}", .timeout.as_secs())]
    Timeout {
        /// The URL being fetched
        url: String,
        /// The per-file timeout that elapsed
        timeout: Duration,
    },

    /// Storage collaborator rejected the content
    #[error("failed to store {name}: {source}")]
    Storage {
        /// Name the content was to be stored under
        name: String,
        /// Underlying storage error
        source: StorageError,
    },
}

/// Errors returned by a [`Storage`](crate::storage::Storage) implementation
#[derive(Debug, Error)]
pub enum StorageError {
    /// Name cannot be used as a file name
    #[error("invalid file name '{0}'")]
    InvalidName(String),

    /// Filesystem failure
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        /// Path being written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Reading the byte stream failed
    #[error("failed to read content: {0}")]
    Stream(std::io::Error),

    /// Backend-specific failure
    #[error("{0}")]
    Other(String),
}

/// Snapshot persistence errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Snapshot file exists but could not be read
    #[error("failed to read snapshot {}: {source}", .path.display())]
    Read {
        /// Snapshot path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Snapshot could not be written or moved into place
    #[error("failed to write snapshot {}: {source}", .path.display())]
    Write {
        /// Snapshot path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Snapshot content is structurally invalid
    #[error("malformed snapshot {}: {source}", .path.display())]
    Decode {
        /// Snapshot path
        path: PathBuf,
        /// Underlying decode error
        source: serde_json::Error,
    },

    /// Snapshot lists the same task twice
    #[error("snapshot {} contains duplicate task id {id}", .path.display())]
    DuplicateId {
        /// Snapshot path
        path: PathBuf,
        /// The repeated ID
        id: TaskId,
    },

    /// Task set could not be encoded
    #[error("failed to encode snapshot: {0}")]
    Encode(serde_json::Error),
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "task not found: 01J...",
///     "details": { "task_id": "01J..." }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Validation(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 409 Conflict
            Error::InvalidTransition { .. } => 409,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,

            // 500 Internal Server Error - Server-side issues
            Error::Persistence(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::Persistence(_) => "persistence_error",
            Error::NotFound(_) => "not_found",
            Error::InvalidTransition { .. } => "invalid_transition",
            Error::ShuttingDown => "shutting_down",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::NotFound(id) => Some(serde_json::json!({
                "task_id": id,
            })),
            Error::InvalidTransition { id, from, to } => Some(serde_json::json!({
                "task_id": id,
                "from": from,
                "to": to,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
