//! Service entry point: load config, restore tasks, serve the API until a
//! termination signal arrives, then save the task snapshot.

use std::path::PathBuf;
use std::process::ExitCode;

use batch_dl::{Config, TaskManager};
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let manager = match TaskManager::new(config) {
        Ok(manager) => manager,
        Err(e) => {
            error!(error = %e, "Failed to create task manager");
            return ExitCode::FAILURE;
        }
    };

    match manager.start().await {
        Ok(requeued) => info!(requeued, "Task manager started"),
        Err(e) => {
            error!(error = %e, "Failed to start task manager");
            return ExitCode::FAILURE;
        }
    }

    let mut api_handle = manager.spawn_api_server();

    let mut status = ExitCode::SUCCESS;
    let api_exited = tokio::select! {
        _ = batch_dl::wait_for_signal() => false,
        result = &mut api_handle => {
            report_api_exit(result);
            status = ExitCode::FAILURE;
            true
        }
    };

    if let Err(e) = manager.shutdown().await {
        error!(error = %e, "Task snapshot was not saved");
        status = ExitCode::FAILURE;
    }

    if !api_exited {
        report_api_exit(api_handle.await);
    }

    status
}

fn report_api_exit(result: Result<batch_dl::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "API server error"),
        Err(e) => error!(error = %e, "API server task panicked"),
    }
}

/// Load the config file named by the first argument, or `config.toml`.
///
/// A missing default file falls back to built-in defaults; a missing file
/// that was named explicitly is an error.
fn load_config() -> batch_dl::Result<Config> {
    match std::env::args_os().nth(1) {
        Some(path) => Config::load(PathBuf::from(path)),
        None if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::load(DEFAULT_CONFIG_PATH)
        }
        None => {
            info!("No {DEFAULT_CONFIG_PATH} found, using defaults");
            Ok(Config::default())
        }
    }
}
