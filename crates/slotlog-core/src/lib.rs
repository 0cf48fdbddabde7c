// # slotlog-core
//
// Core library for the slotlog request/confirmation tracker.
//
// ## Architecture Overview
//
// - **ClientKey**: Sanitized, address-derived namespace for a client's buckets
// - **RecordStore**: Trait for bucket persistence (file or memory)
// - **SlotLedger**: Correlates slot requests with confirmations and logs visits
// - **TimeDisplay**: Parses, offsets and reformats stored timestamps
// - **render**: Operator HTML views
//
// ## Design Principles
//
// 1. **Library-First**: The HTTP crate and daemon are thin layers over this crate
// 2. **Injected Storage**: The ledger only sees `Arc<dyn RecordStore>`
// 3. **Serialized Writes**: Read-modify-write is atomic per bucket, so no update is lost
// 4. **Verbatim Records**: Client timestamps and promoted records are never rewritten

pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod key;
pub mod locks;
pub mod record;
pub mod render;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{DisplayConfig, LedgerConfig, ServerConfig, SlotlogConfig, StoreConfig};
pub use display::{TimeDisplay, sorted_by_timestamp};
pub use engine::{LedgerEvent, SlotLedger};
pub use error::{Error, Result};
pub use key::{Bucket, BucketKey, ClientKey, Scope};
pub use record::{SlotRecord, VisitRecord};
pub use state::{FileRecordStore, MemoryRecordStore, open_store};
pub use traits::RecordStore;
