//! Application state for the API server

use crate::{Config, TaskManager};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the task manager and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The task manager handling submissions and queries
    pub manager: Arc<TaskManager>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(manager: Arc<TaskManager>, config: Arc<Config>) -> Self {
        Self { manager, config }
    }
}
