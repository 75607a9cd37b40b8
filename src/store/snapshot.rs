//! Snapshot codec: converts the task set to and from its on-disk form.
//!
//! The snapshot is a JSON array with one record per task, ordered by
//! `created_at` (ties broken by id). Records carry the rendered status string,
//! never a numeric code.
//!
//! Sanitization happens on encode: a task that is `running` is written as
//! `pending` with its error cleared, so that a snapshot taken while work is in
//! flight always describes resumable tasks.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::PersistenceError;
use crate::types::{Status, Task};

/// Apply the snapshot rules to a single task.
///
/// - `running` becomes `pending` (the interrupted run will be redone from its first URL)
/// - `error` is kept only for `failed` tasks
pub fn sanitize(mut task: Task) -> Task {
    if task.status == Status::Running {
        task.status = Status::Pending;
    }
    if task.status != Status::Failed {
        task.error = None;
    }
    task
}

/// Encode tasks into snapshot bytes (sanitized and ordered)
pub fn encode(tasks: impl IntoIterator<Item = Task>) -> serde_json::Result<Vec<u8>> {
    let mut records: Vec<Task> = tasks.into_iter().map(sanitize).collect();
    records.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    serde_json::to_vec_pretty(&records)
}

/// Decode snapshot bytes.
///
/// Empty (or whitespace-only) input is an empty task set. Anything else must be
/// a well-formed array of task records.
pub fn decode(bytes: &[u8]) -> serde_json::Result<Vec<Task>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(bytes)
}

/// Read a snapshot file; a missing file is `Ok(None)`
pub async fn read(path: &Path) -> Result<Option<Vec<u8>>, PersistenceError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PersistenceError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write `bytes` to `path` atomically.
///
/// Content goes to a sibling `.tmp` file, is synced, and is then renamed over
/// the target, so readers see either the old snapshot or the new one.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let write_err = |source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp = tmp_path(path);
    let mut file = tokio::fs::File::create(&tmp).await.map_err(write_err)?;
    file.write_all(bytes).await.map_err(write_err)?;
    file.sync_all().await.map_err(write_err)?;
    drop(file);

    tokio::fs::rename(&tmp, path).await.map_err(write_err)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
