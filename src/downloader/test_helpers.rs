//! Shared test helpers for creating TaskManager instances in tests.

use crate::config::Config;
use crate::downloader::TaskManager;
use crate::error::StorageError;
use crate::storage::Storage;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use tokio::io::{AsyncRead, AsyncReadExt};

/// In-memory storage that records every save, in order
#[derive(Default)]
pub(crate) struct RecordingStorage {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingStorage {
    /// Make every save under `name` fail
    pub(crate) fn fail_on(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    /// All saves so far as (name, content)
    pub(crate) fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().unwrap().clone()
    }

    /// Names of all saves so far
    pub(crate) fn names(&self) -> Vec<String> {
        self.saved().into_iter().map(|(name, _)| name).collect()
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn save(
        &self,
        name: &str,
        content: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<u64, StorageError> {
        if self.failing.lock().unwrap().contains(name) {
            return Err(StorageError::Other("disk full".to_string()));
        }

        let mut buf = Vec::new();
        content
            .read_to_end(&mut buf)
            .await
            .map_err(StorageError::Stream)?;
        let len = buf.len() as u64;
        self.saved.lock().unwrap().push((name.to_string(), buf));
        Ok(len)
    }
}

/// Config pointing every path into `dir`, with a short per-file timeout
pub(crate) fn test_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.storage.downloads_dir = dir.join("downloads");
    config.tasks.file = dir.join("tasks.json");
    config.worker_pool.num_workers = 2;
    config.worker_pool.task_queue_size = 16;
    config.worker_pool.file_timeout = Duration::from_secs(10);
    config
}

/// Helper to create a test TaskManager backed by a [`RecordingStorage`].
/// Returns the manager, the storage, and the tempdir (which must be kept alive).
pub(crate) fn create_test_manager() -> (TaskManager, Arc<RecordingStorage>, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let storage = Arc::new(RecordingStorage::default());
    let manager = TaskManager::with_storage(
        test_config(temp_dir.path()),
        Arc::clone(&storage) as Arc<dyn Storage>,
    );
    (manager, storage, temp_dir)
}
