// # Record Store Trait
//
// Defines the interface for bucket persistence.
//
// ## Purpose
//
// A record store holds insertion-ordered sequences of JSON records, one
// per (scope, bucket) pair. Every mutation is a whole-sequence
// read-modify-write, so implementations serialize mutations per bucket.
//
// ## Implementations
//
// - File-based: one JSON array file per bucket
// - Memory: HashMap of sequences, for tests and throwaway deployments
//
// ## Usage
//
// ```rust
// use slotlog_core::key::{Bucket, BucketKey, ClientKey};
// use slotlog_core::state::MemoryRecordStore;
// use slotlog_core::traits::RecordStore;
//
// #[tokio::main]
// async fn main() -> slotlog_core::Result<()> {
//     let store = MemoryRecordStore::new();
//     let key = BucketKey::client(&ClientKey::sanitize("10.0.0.1"), Bucket::Pending);
//
//     store.append(&key, serde_json::json!({"data": "abc", "time": "t"})).await?;
//     assert_eq!(store.load(&key).await?.len(), 1);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::key::BucketKey;

/// In-place edit applied to a loaded sequence
///
/// Returning `Err` aborts the edit and nothing is written.
pub type Mutation<'a> = Box<dyn FnOnce(&mut Vec<Value>) -> Result<()> + Send + 'a>;

/// Trait for record store implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Atomicity
///
/// [`RecordStore::update`] is the only mutating primitive. It must run the
/// load, the mutation and the write as one step with respect to any other
/// call on the same [`BucketKey`]; two concurrent appends to one bucket
/// must both survive. Calls on different keys may proceed in parallel.
///
/// # Initialization
///
/// Loading a bucket that does not exist yet creates it empty.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load the full sequence for a bucket
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Value>)`: Records in insertion order (empty for a new bucket)
    /// - `Err(Error::Parse)`: Stored data is not a JSON array
    /// - `Err(Error)`: Storage error
    async fn load(&self, key: &BucketKey) -> Result<Vec<Value>>;

    /// Atomically load, mutate and rewrite a bucket
    ///
    /// # Parameters
    ///
    /// - `key`: The bucket to edit
    /// - `mutate`: Edit applied to the loaded sequence
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Mutation applied and persisted
    /// - `Err(Error)`: Mutation rejected or storage error; bucket unchanged
    async fn update<'a>(&self, key: &BucketKey, mutate: Mutation<'a>) -> Result<()>;

    /// List every bucket the store currently holds
    async fn list_buckets(&self) -> Result<Vec<BucketKey>>;

    /// Persist any pending changes
    ///
    /// Stores that write through on every update have nothing to do here.
    async fn flush(&self) -> Result<()>;

    /// Append a record to the end of a bucket
    async fn append(&self, key: &BucketKey, record: Value) -> Result<()> {
        self.update(
            key,
            Box::new(move |items: &mut Vec<Value>| {
                items.push(record);
                Ok(())
            }),
        )
        .await
    }

    /// Remove and return the record at `index`
    ///
    /// # Returns
    ///
    /// - `Ok(Value)`: The removed record
    /// - `Err(Error::NotFound)`: `index` is past the end; bucket unchanged
    async fn remove_at(&self, key: &BucketKey, index: usize) -> Result<Value> {
        let mut removed = None;
        let slot = &mut removed;
        let label = key.to_string();
        self.update(
            key,
            Box::new(move |items: &mut Vec<Value>| {
                if index >= items.len() {
                    return Err(Error::not_found(format!(
                        "index {index} in {label} (len {})",
                        items.len()
                    )));
                }
                *slot = Some(items.remove(index));
                Ok(())
            }),
        )
        .await?;

        removed.ok_or_else(|| Error::store("removal produced no record"))
    }
}
