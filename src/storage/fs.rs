//! Filesystem-backed object store

use crate::storage::traits::{ObjectStore, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Stores each object as a file named after its key
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Creates a store rooted at `root`; the directory is created on first put
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path an object with this key is written to
    pub fn object_path(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, body: &[u8]) -> StorageResult<()> {
        let path = self.object_path(key)?;
        if tokio::fs::try_exists(&path).await? {
            tracing::debug!("store: {} already present", key);
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.root).await?;

        // Write under a temporary name so readers never see a partial object
        let partial = self.root.join(format!("{}.partial", key));
        tokio::fs::write(&partial, body).await?;
        tokio::fs::rename(&partial, &path).await?;
        Ok(())
    }
}
