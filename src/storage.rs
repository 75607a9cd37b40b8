//! Storage collaborator: persists one downloaded byte stream under a name.
//!
//! The pipeline calls [`Storage::save`] once per URL, with `name` derived from
//! the URL's final path segment. [`LocalStorage`] writes into a single
//! directory; tests and embedders can supply their own implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::error::StorageError;

/// Abstraction over where downloaded content ends up
#[async_trait]
pub trait Storage: Send + Sync {
    /// Consume `content` to the end and persist it under `name`.
    ///
    /// Returns the number of bytes written.
    async fn save(
        &self,
        name: &str,
        content: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<u64, StorageError>;
}

/// Storage backed by a directory on the local filesystem
#[derive(Clone, Debug)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    /// Create a LocalStorage rooted at `dir` (created on first save)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory files are written into
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Reject names that would escape the storage directory
fn validate_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[async_trait]
impl Storage for LocalStorage {
    async fn save(
        &self,
        name: &str,
        content: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<u64, StorageError> {
        validate_name(name)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StorageError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(name);
        let part = PartFile::new(self.dir.join(format!(".{name}.{}.part", ulid::Ulid::new())));
        let io_err = |source| StorageError::Io {
            path: path.clone(),
            source,
        };

        let mut file = tokio::fs::File::create(part.path()).await.map_err(io_err)?;
        let written = tokio::io::copy(content, &mut file).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;
        drop(file);

        tokio::fs::rename(part.path(), &path).await.map_err(io_err)?;
        part.keep();

        tracing::debug!(path = %path.display(), bytes = written, "Saved file");
        Ok(written)
    }
}

/// Temporary sibling of a file being saved.
///
/// Removed on drop unless [`keep`](Self::keep) was called after the rename,
/// so a failed, timed out or cancelled save never touches the target name.
struct PartFile {
    path: PathBuf,
    renamed: bool,
}

impl PartFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            renamed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn keep(mut self) {
        self.renamed = true;
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if !self.renamed {
            std::fs::remove_file(&self.path).ok();
        }
    }
}
