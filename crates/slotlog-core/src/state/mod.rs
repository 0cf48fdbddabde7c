// # Record Store Implementations
//
// This module provides implementations of the RecordStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileRecordStore;
pub use memory::MemoryRecordStore;

use std::sync::Arc;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::traits::RecordStore;

/// Open the store described by `config`
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    config.validate()?;

    let store: Arc<dyn RecordStore> = match config {
        StoreConfig::File { dir } => Arc::new(FileRecordStore::new(dir).await?),
        StoreConfig::Memory => {
            tracing::warn!("Using in-memory record store; records are lost on restart");
            Arc::new(MemoryRecordStore::new())
        }
    };

    tracing::info!("Record store ready: {}", config.type_name());
    Ok(store)
}
