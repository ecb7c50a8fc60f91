//! Object store trait and error types

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during object store operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A put-only blob store for page bodies
///
/// Keys are content hashes, so putting the same body twice is harmless and
/// implementations may skip the second write.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `body` under `key`
    async fn put(&self, key: &str, body: &[u8]) -> StorageResult<()>;
}
