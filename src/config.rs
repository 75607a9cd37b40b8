//! Configuration types for batch-dl
//!
//! Loaded from a TOML file with one table per concern. Every field has a
//! default, so an empty file is a valid configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Top-level configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// REST API settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Worker pool sizing and per-file timeout
    #[serde(default)]
    pub worker_pool: WorkerPoolConfig,

    /// Where downloaded files are written
    #[serde(default)]
    pub storage: StorageConfig,

    /// Task snapshot location
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Worker pool configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct WorkerPoolConfig {
    /// Number of concurrent workers (default: 4)
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    /// Capacity of the task queue; submissions wait when it is full (default: 100)
    #[serde(default = "default_task_queue_size")]
    pub task_queue_size: usize,

    /// Timeout for downloading a single URL, in seconds (default: 180)
    #[serde(default = "default_file_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub file_timeout: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            num_workers: default_num_workers(),
            task_queue_size: default_task_queue_size(),
            file_timeout: default_file_timeout(),
        }
    }
}

/// Download storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Download directory (default: "./downloads")
    #[serde(default = "default_downloads_dir")]
    #[schema(value_type = String)]
    pub downloads_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            downloads_dir: default_downloads_dir(),
        }
    }
}

/// Task persistence configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TasksConfig {
    /// Snapshot file (default: "./tasks.json")
    #[serde(default = "default_tasks_file")]
    #[schema(value_type = String)]
    pub file: PathBuf,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            file: default_tasks_file(),
        }
    }
}

impl Config {
    /// Load and validate the configuration file at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw).map_err(|e| Error::Config {
            message: e.to_string(),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the worker pool cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.worker_pool.num_workers == 0 {
            return Err(Error::Config {
                message: "num_workers must be at least 1".to_string(),
                key: Some("worker_pool.num_workers".to_string()),
            });
        }
        if self.worker_pool.task_queue_size == 0 {
            return Err(Error::Config {
                message: "task_queue_size must be at least 1".to_string(),
                key: Some("worker_pool.task_queue_size".to_string()),
            });
        }
        if self.worker_pool.file_timeout.is_zero() {
            return Err(Error::Config {
                message: "file_timeout must be at least 1 second".to_string(),
                key: Some("worker_pool.file_timeout".to_string()),
            });
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_num_workers() -> usize {
    4
}

fn default_task_queue_size() -> usize {
    100
}

fn default_file_timeout() -> Duration {
    Duration::from_secs(180)
}

fn default_downloads_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_tasks_file() -> PathBuf {
    PathBuf::from("./tasks.json")
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
