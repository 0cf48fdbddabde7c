//! Slot ledger
//!
//! The SlotLedger is responsible for:
//! - Recording slot requests into a client's pending bucket
//! - Promoting a pending request to confirmed when its token comes back
//! - Logging visits, per client or globally
//! - Serving typed views of every bucket
//!
//! ## Flow
//!
//! ```text
//! POST slot-request ──► Pending(client) ──┐
//!        │                                 │ confirm(token)
//!        └──────────► Visits(client)       ▼
//!                                   Confirmed(client)
//! ```
//!
//! ## Promotion
//!
//! 1. Load Pending(client)
//! 2. Find the first record whose token matches (oldest duplicate wins)
//! 3. Append it unchanged to Confirmed(client)
//! 4. Remove it from Pending(client)
//!
//! Confirmed is written before Pending is trimmed. A crash between the two
//! writes leaves the token in both buckets, never in neither.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::error::{Error, Result};
use crate::key::{Bucket, BucketKey, ClientKey, Scope};
use crate::locks::KeyedLocks;
use crate::record::{SlotRecord, VisitRecord};
use crate::traits::RecordStore;

/// Body of the 404 returned for an unmatched confirmation
pub const PENDING_NOT_FOUND: &str = "Pending slot request not found";

/// Events emitted by the SlotLedger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    /// Slot request stored as pending
    RequestRecorded { client: ClientKey, token: String },

    /// Pending request promoted to confirmed
    Confirmed { client: ClientKey, token: String },

    /// Confirmation arrived with no matching pending request
    ConfirmMissed { client: ClientKey, token: String },

    /// Request appended to the global log
    RequestLogged { token: String },

    /// Visit appended to the global visit log
    VisitLogged { page: Option<String> },
}

/// Request/confirmation correlator
///
/// Every operation on one scope (a client, or the global scope) runs
/// under that scope's lock, so a confirmation can never interleave with
/// a request from the same client.
pub struct SlotLedger {
    /// Bucket persistence
    store: Arc<dyn RecordStore>,

    /// Also log a visit for every slot request
    merge_visits: bool,

    /// Per-scope serialization
    scopes: KeyedLocks<Scope>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<LedgerEvent>,
}

impl SlotLedger {
    /// Create a new ledger
    ///
    /// # Returns
    ///
    /// A tuple of (ledger, event_receiver) where event_receiver yields ledger events
    pub fn new(
        store: Arc<dyn RecordStore>,
        config: &LedgerConfig,
    ) -> Result<(Self, mpsc::Receiver<LedgerEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let ledger = Self {
            store,
            merge_visits: config.merge_visits,
            scopes: KeyedLocks::new(),
            event_tx: tx,
        };

        Ok((ledger, rx))
    }

    /// Underlying record store
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Store a slot request for `client`
    ///
    /// # Errors
    ///
    /// [`Error::MissingField`] when `token` or `time` is empty.
    pub async fn record_request(
        &self,
        client: &ClientKey,
        token: &str,
        time: &str,
    ) -> Result<SlotRecord> {
        if token.is_empty() || time.is_empty() {
            return Err(Error::missing_field("data/time"));
        }

        let scope = Scope::Client(client.clone());
        let _guard = self.scopes.lock(&scope).await;

        if self.merge_visits {
            let visit = VisitRecord::new(time);
            self.store
                .append(&BucketKey::client(client, Bucket::Visits), serde_json::to_value(&visit)?)
                .await?;
        }

        let record = SlotRecord::new(token, time);
        self.store
            .append(&BucketKey::client(client, Bucket::Pending), serde_json::to_value(&record)?)
            .await?;

        debug!("Recorded slot request for {}", client);
        self.emit_event(LedgerEvent::RequestRecorded {
            client: client.clone(),
            token: token.to_string(),
        });
        Ok(record)
    }

    /// Promote the oldest pending request carrying `token`
    ///
    /// # Returns
    ///
    /// - `Ok(SlotRecord)`: The promoted record
    /// - `Err(Error::NotFound)`: No pending request matches; nothing changed
    /// - `Err(Error::MissingField)`: `token` is empty
    pub async fn confirm(&self, client: &ClientKey, token: &str) -> Result<SlotRecord> {
        if token.is_empty() {
            return Err(Error::missing_field("data"));
        }

        let scope = Scope::Client(client.clone());
        let _guard = self.scopes.lock(&scope).await;

        let pending_key = BucketKey::client(client, Bucket::Pending);
        let confirmed_key = BucketKey::client(client, Bucket::Confirmed);

        let pending = self.store.load(&pending_key).await?;
        // Touch Confirmed so both buckets exist after any confirmation attempt
        self.store.load(&confirmed_key).await?;

        let Some(index) = pending.iter().position(|r| token_of(r) == Some(token)) else {
            debug!("No pending request for {} matches the token", client);
            self.emit_event(LedgerEvent::ConfirmMissed {
                client: client.clone(),
                token: token.to_string(),
            });
            return Err(Error::not_found(PENDING_NOT_FOUND));
        };

        let found = pending[index].clone();
        self.store.append(&confirmed_key, found.clone()).await?;
        self.store.remove_at(&pending_key, index).await?;

        info!("Confirmed slot request for {} (pending position {})", client, index);
        self.emit_event(LedgerEvent::Confirmed {
            client: client.clone(),
            token: token.to_string(),
        });

        // Legacy entries may lack fields; the promotion itself already succeeded
        Ok(serde_json::from_value(found).unwrap_or_else(|_| SlotRecord {
            token: token.to_string(),
            timestamp: String::new(),
            received_at: None,
        }))
    }

    /// Append a request to the global log
    pub async fn log_request(&self, token: &str, time: &str) -> Result<SlotRecord> {
        if token.is_empty() || time.is_empty() {
            return Err(Error::missing_field("data/time"));
        }

        let _guard = self.scopes.lock(&Scope::Global).await;
        let record = SlotRecord::new(token, time);
        self.store
            .append(&BucketKey::global(Bucket::Log), serde_json::to_value(&record)?)
            .await?;

        self.emit_event(LedgerEvent::RequestLogged {
            token: token.to_string(),
        });
        Ok(record)
    }

    /// Append a visit to the global visit log
    pub async fn log_visit(&self, page: Option<&str>, time: &str) -> Result<VisitRecord> {
        if time.is_empty() {
            return Err(Error::missing_field("time"));
        }

        let _guard = self.scopes.lock(&Scope::Global).await;
        let mut visit = VisitRecord::new(time);
        if let Some(page) = page.filter(|p| !p.is_empty()) {
            visit = visit.with_page(page);
        }
        self.store
            .append(&BucketKey::global(Bucket::Visits), serde_json::to_value(&visit)?)
            .await?;

        self.emit_event(LedgerEvent::VisitLogged {
            page: visit.page.clone(),
        });
        Ok(visit)
    }

    /// Requests awaiting confirmation, in arrival order
    pub async fn pending(&self, client: &ClientKey) -> Result<Vec<SlotRecord>> {
        self.load_typed(&BucketKey::client(client, Bucket::Pending)).await
    }

    /// Confirmed requests, in confirmation order
    pub async fn confirmed(&self, client: &ClientKey) -> Result<Vec<SlotRecord>> {
        self.load_typed(&BucketKey::client(client, Bucket::Confirmed)).await
    }

    /// Visits logged for one client, in arrival order
    pub async fn visits(&self, client: &ClientKey) -> Result<Vec<VisitRecord>> {
        self.load_typed(&BucketKey::client(client, Bucket::Visits)).await
    }

    /// Global visit log
    pub async fn global_visits(&self) -> Result<Vec<VisitRecord>> {
        self.load_typed(&BucketKey::global(Bucket::Visits)).await
    }

    /// Global request log
    pub async fn request_log(&self) -> Result<Vec<SlotRecord>> {
        self.load_typed(&BucketKey::global(Bucket::Log)).await
    }

    /// Persist anything the store still buffers
    pub async fn flush(&self) -> Result<()> {
        self.store.flush().await
    }

    /// Load a bucket, skipping entries that do not have the expected shape
    async fn load_typed<T: DeserializeOwned>(&self, key: &BucketKey) -> Result<Vec<T>> {
        let values = self.store.load(key).await?;
        let total = values.len();

        let records: Vec<T> = values
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect();

        if records.len() != total {
            warn!(
                "Skipped {} malformed record(s) in {}",
                total - records.len(),
                key
            );
        }
        Ok(records)
    }

    /// Emit a ledger event
    fn emit_event(&self, event: LedgerEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    "Event channel full, dropping event. \
                     Consider increasing event_channel_capacity."
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                // Nobody is listening
            }
        }
    }
}

/// Correlation token of a stored record, if it has one
fn token_of(record: &Value) -> Option<&str> {
    record.get("data").and_then(Value::as_str)
}
