//! # batch-dl
//!
//! Concurrent batch download service. A task is an ordered list of URLs;
//! tasks are queued on a bounded worker pool, each task downloads its files
//! one after another, and the set of tasks survives restarts through a JSON
//! snapshot.
//!
//! ## Task lifecycle
//!
//! ```text
//! Pending ──▶ Running ──▶ Completed
//!                   └───▶ Failed
//! ```
//!
//! A task interrupted by shutdown is saved as Pending and runs again from its
//! first URL on the next start.
//!
//! ## Quick Start
//!
//! ```no_run
//! use batch_dl::{Config, TaskManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TaskManager::new(Config::default())?;
//!     manager.start().await?;
//!
//!     // Subscribe to events
//!     let mut events = manager.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let task = manager
//!         .create_task(vec!["https://example.com/report.pdf".to_string()])
//!         .await?;
//!     let finished = manager.wait_for_task(&task.id).await?;
//!     println!("{} finished as {}", finished.id, finished.status);
//!
//!     manager.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// One-shot completion signals
pub mod completion;
/// Configuration types
pub mod config;
/// Task manager (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Bounded worker pool and the per-task download pipeline
pub mod pool;
/// Destinations for downloaded content
pub mod storage;
/// In-memory task store and its snapshot codec
pub mod store;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use completion::Completion;
pub use config::Config;
pub use downloader::TaskManager;
pub use error::{
    ApiError, DownloadError, Error, ErrorDetail, PersistenceError, Result, StorageError,
    ToHttpStatus,
};
pub use pool::{DownloadPipeline, RunOutcome, WorkerPool};
pub use storage::{LocalStorage, Storage};
pub use store::TaskStore;
pub use types::{Event, Status, Task, TaskId};

/// Helper function to run the manager with graceful signal handling.
///
/// Waits for a termination signal and then calls the manager's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use batch_dl::{Config, TaskManager, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let manager = TaskManager::new(Config::default())?;
///     manager.start().await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(&manager).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(manager: &TaskManager) -> Result<()> {
    wait_for_signal().await;
    manager.shutdown().await
}

/// Wait for a termination signal (SIGTERM/SIGINT on Unix, Ctrl+C elsewhere).
#[cfg(unix)]
pub async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

/// Wait for a termination signal (SIGTERM/SIGINT on Unix, Ctrl+C elsewhere).
#[cfg(not(unix))]
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
