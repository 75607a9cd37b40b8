//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] - Task submission and queries
//! - [`system`] - Health, events, OpenAPI

use serde::{Deserialize, Serialize};

mod system;
mod tasks;

// Re-export all handlers so `routes::function_name` works
pub use system::*;
pub use tasks::*;

// ============================================================================
// Request Types (shared across handlers)
// ============================================================================

/// Request body for POST /tasks
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreateTaskRequest {
    /// Absolute http(s) URLs to download, in order
    pub urls: Vec<String>,
}
