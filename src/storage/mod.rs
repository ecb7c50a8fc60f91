//! Object storage for raw page bodies
//!
//! Bodies are content addressed: the key is the SHA-256 of the body, so
//! identical pages share one object and a re-crawl of an unchanged page
//! produces the same key.

mod fs;
mod memory;
mod traits;

pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;
pub use traits::{ObjectStore, StorageError, StorageResult};

use sha2::{Digest, Sha256};

/// Computes the content hash (and storage key) of a page body
///
/// # Example
///
/// ```
/// use disco_crawl::storage::content_hash;
///
/// let key = content_hash(b"hello");
/// assert_eq!(key.len(), 64);
/// assert_eq!(key, content_hash(b"hello"));
/// ```
pub fn content_hash(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}
