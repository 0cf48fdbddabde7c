// # Memory Record Store
//
// In-memory implementation of RecordStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for testing and for deployments where the operator only needs
// the views while the process is up.
//
// ## Crash Behavior
//
// - All buckets are lost on restart/crash
// - No recovery possible (state is in-memory only)

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::key::BucketKey;
use crate::traits::record_store::{Mutation, RecordStore};

/// In-memory record store implementation
///
/// All buckets live in a HashMap protected by a RwLock. The write lock
/// covers the whole read-modify-write of an update.
///
/// # Example
///
/// ```rust,no_run
/// use slotlog_core::key::{Bucket, BucketKey};
/// use slotlog_core::state::MemoryRecordStore;
/// use slotlog_core::traits::RecordStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryRecordStore::new();
///     let visits = BucketKey::global(Bucket::Visits);
///
///     store.append(&visits, serde_json::json!({"time": "2024-01-01 10:00:00"})).await?;
///     assert_eq!(store.load(&visits).await?.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<RwLock<HashMap<BucketKey, Vec<Value>>>>,
}

impl MemoryRecordStore {
    /// Create a new empty memory record store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of buckets in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Clear all buckets from the store
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn load(&self, key: &BucketKey) -> Result<Vec<Value>> {
        {
            let guard = self.inner.read().await;
            if let Some(items) = guard.get(key) {
                return Ok(items.clone());
            }
        }

        let mut guard = self.inner.write().await;
        Ok(guard.entry(key.clone()).or_default().clone())
    }

    async fn update<'a>(&self, key: &BucketKey, mutate: Mutation<'a>) -> Result<()> {
        let mut guard = self.inner.write().await;
        let mut items = guard.get(key).cloned().unwrap_or_default();
        mutate(&mut items)?;
        guard.insert(key.clone(), items);
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<BucketKey>> {
        let guard = self.inner.read().await;
        let mut keys: Vec<_> = guard.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn flush(&self) -> Result<()> {
        // No-op for memory store (everything is already "persisted")
        Ok(())
    }
}
