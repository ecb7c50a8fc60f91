//! In-memory object store

use crate::storage::traits::{ObjectStore, StorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Keeps objects in a shared map; clones see the same contents
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(key).cloned())
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, body: &[u8]) -> StorageResult<()> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|e| crate::storage::StorageError::Backend(e.to_string()))?;
        objects
            .entry(key.to_string())
            .or_insert_with(|| body.to_vec());
        Ok(())
    }
}
