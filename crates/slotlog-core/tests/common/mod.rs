//! Test doubles and common utilities for ledger contract tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use slotlog_core::error::Result;
use slotlog_core::key::{Bucket, BucketKey, ClientKey};
use slotlog_core::traits::{Mutation, RecordStore};
use slotlog_core::{LedgerConfig, LedgerEvent, MemoryRecordStore, SlotLedger};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// A record store that counts calls and delegates to memory
pub struct CountingStore {
    inner: MemoryRecordStore,
    loads: Arc<AtomicUsize>,
    updates: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryRecordStore::new(),
            loads: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times update() was called
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Get the number of times load() was called
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn load(&self, key: &BucketKey) -> Result<Vec<Value>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(key).await
    }

    async fn update<'a>(&self, key: &BucketKey, mutate: Mutation<'a>) -> Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(key, mutate).await
    }

    async fn list_buckets(&self) -> Result<Vec<BucketKey>> {
        self.inner.list_buckets().await
    }

    async fn flush(&self) -> Result<()> {
        self.inner.flush().await
    }
}

/// Ledger over a fresh counting store
pub fn counting_ledger() -> (SlotLedger, Arc<CountingStore>, mpsc::Receiver<LedgerEvent>) {
    let store = Arc::new(CountingStore::new());
    let (ledger, rx) = SlotLedger::new(store.clone(), &LedgerConfig::default())
        .expect("ledger construction succeeds");
    (ledger, store, rx)
}

/// Client key for a literal address
pub fn client(address: &str) -> ClientKey {
    ClientKey::sanitize(address)
}

/// Raw contents of every bucket of one client
pub async fn snapshot(store: &dyn RecordStore, client: &ClientKey) -> Vec<Vec<Value>> {
    let mut out = Vec::new();
    for bucket in [Bucket::Pending, Bucket::Confirmed, Bucket::Visits] {
        out.push(
            store
                .load(&BucketKey::client(client, bucket))
                .await
                .expect("load succeeds"),
        );
    }
    out
}

/// Tokens of a list of slot records
pub fn tokens(records: &[slotlog_core::SlotRecord]) -> Vec<&str> {
    records.iter().map(|r| r.token.as_str()).collect()
}
