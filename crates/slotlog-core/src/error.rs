//! Error types for slotlog
//!
//! This module defines all error types used throughout the crate.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for slotlog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for slotlog
#[derive(Error, Debug)]
pub enum Error {
    /// A required request field was absent or empty
    #[error("Missing field: {0}")]
    MissingField(String),

    /// The request carried no usable originating address
    #[error("Client address unavailable")]
    MissingAddress,

    /// Record or bucket entry not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A bucket's backing data is not a valid JSON array
    #[error("Failed to parse bucket {}: {message}", path.display())]
    Parse {
        /// Location of the unreadable data
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Record store errors
    #[error("Record store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a parse error for the data at `path`
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a record store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for errors caused by the caller rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingField(_) | Self::MissingAddress | Self::NotFound(_))
    }
}
