//! Contract Test: No lost updates
//!
//! Every mutation is a whole-bucket read-modify-write. Without per-bucket
//! serialization two near-simultaneous appends both read the old array
//! and the second write discards the first.
//!
//! Constraints verified:
//! - Concurrent appends to one bucket all survive (file and memory stores)
//! - Concurrent requests and confirmations for one client stay consistent

mod common;

use common::*;
use serde_json::json;
use slotlog_core::key::{Bucket, BucketKey};
use slotlog_core::{FileRecordStore, LedgerConfig, MemoryRecordStore, RecordStore, SlotLedger};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::tempdir;

const WRITERS: usize = 64;

async fn hammer_appends(store: Arc<dyn RecordStore>) {
    let key = BucketKey::client(&client("10.0.0.1"), Bucket::Pending);

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let store = Arc::clone(&store);
            let key = key.clone();
            tokio::spawn(async move {
                store
                    .append(&key, json!({"data": format!("tok-{i}"), "time": "t"}))
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.expect("task joins").expect("append succeeds");
    }

    let items = store.load(&key).await.unwrap();
    assert_eq!(items.len(), WRITERS, "every concurrent append must survive");

    let distinct: HashSet<_> = items
        .iter()
        .map(|v| v["data"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(distinct.len(), WRITERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_file_appends_are_not_lost() {
    let dir = tempdir().unwrap();
    let store = FileRecordStore::new(dir.path()).await.unwrap();
    hammer_appends(Arc::new(store)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_memory_appends_are_not_lost() {
    hammer_appends(Arc::new(MemoryRecordStore::new())).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_and_confirms_stay_consistent() {
    let dir = tempdir().unwrap();
    let store: Arc<dyn RecordStore> = Arc::new(FileRecordStore::new(dir.path()).await.unwrap());
    let (ledger, _rx) = SlotLedger::new(store, &LedgerConfig::default()).unwrap();
    let ledger = Arc::new(ledger);
    let me = client("10.0.0.1");

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let ledger = Arc::clone(&ledger);
            let me = me.clone();
            tokio::spawn(async move {
                let token = format!("tok-{i}");
                ledger
                    .record_request(&me, &token, "2024-01-01 10:00:00")
                    .await
                    .unwrap();
                if i % 2 == 0 {
                    ledger.confirm(&me, &token).await.unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    let pending = ledger.pending(&me).await.unwrap();
    let confirmed = ledger.confirmed(&me).await.unwrap();
    assert_eq!(pending.len(), 16);
    assert_eq!(confirmed.len(), 16);
    assert_eq!(ledger.visits(&me).await.unwrap().len(), 32);

    let pending_tokens: HashSet<_> = pending.iter().map(|r| r.token.clone()).collect();
    assert!(confirmed.iter().all(|r| !pending_tokens.contains(&r.token)));
}
