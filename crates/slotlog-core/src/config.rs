//! Configuration types for slotlog
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Main slotlog configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotlogConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Record store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Ledger behaviour
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Operator view settings
    #[serde(default)]
    pub display: DisplayConfig,
}

impl SlotlogConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.server.validate()?;
        self.store.validate()?;
        self.ledger.validate()?;
        self.display.validate()?;
        Ok(())
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_bind")]
    pub bind: IpAddr,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Validate the server configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.port == 0 {
            return Err(crate::Error::config("Server port must be > 0"));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// One JSON file per bucket
    File {
        /// Directory holding the bucket files
        dir: String,
    },

    /// In-memory store (not persistent)
    Memory,
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::File { dir } => {
                if dir.trim().is_empty() {
                    return Err(crate::Error::config("File store directory cannot be empty"));
                }
                Ok(())
            }
            StoreConfig::Memory => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::File { .. } => "file",
            StoreConfig::Memory => "memory",
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            dir: default_data_dir(),
        }
    }
}

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Also log a visit for every slot request
    ///
    /// When disabled, visits only come from the global `/visit` endpoint.
    #[serde(default = "default_merge_visits")]
    pub merge_visits: bool,

    /// Capacity of the ledger event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl LedgerConfig {
    /// Validate the ledger configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            merge_visits: default_merge_visits(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Operator view configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Seconds subtracted from visit timestamps before display
    ///
    /// Set to 0 to show timestamps as stored.
    #[serde(default = "default_offset_secs")]
    pub offset_secs: u32,
}

impl DisplayConfig {
    /// Largest accepted display offset
    pub const MAX_OFFSET_SECS: u32 = 3600;

    /// Validate the display configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.offset_secs > Self::MAX_OFFSET_SECS {
            return Err(crate::Error::config(format!(
                "Display offset must be at most {} seconds, got {}",
                Self::MAX_OFFSET_SECS,
                self.offset_secs
            )));
        }
        Ok(())
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            offset_secs: default_offset_secs(),
        }
    }
}

fn default_bind() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    3000
}

fn default_data_dir() -> String {
    "slot_data".to_string()
}

fn default_merge_visits() -> bool {
    true
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_offset_secs() -> u32 {
    2
}
