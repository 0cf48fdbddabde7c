//! Stored record shapes
//!
//! Field names on disk are `data`, `time` and `page`, so bucket files
//! written by earlier deployments load unchanged. `received_at` is only
//! present on records written by this server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A slot request, pending or confirmed
///
/// Confirmed records are the pending record moved as-is; nothing is
/// rewritten during promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    /// Correlation token linking a request to its confirmation
    #[serde(rename = "data")]
    pub token: String,

    /// Client-supplied timestamp, stored verbatim
    #[serde(rename = "time")]
    pub timestamp: String,

    /// Server clock at the moment the record was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
}

impl SlotRecord {
    /// Create a record stamped with the current server time
    pub fn new(token: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            timestamp: timestamp.into(),
            received_at: Some(Utc::now()),
        }
    }
}

/// An access log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    /// Page visited, when the caller reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    /// Client-supplied timestamp, stored verbatim
    #[serde(rename = "time")]
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
}

impl VisitRecord {
    /// Create a visit with no page
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            page: None,
            timestamp: timestamp.into(),
            received_at: Some(Utc::now()),
        }
    }

    /// Attach the visited page
    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }
}

/// Anything carrying a client timestamp, for sorting and display
pub trait Timestamped {
    fn timestamp(&self) -> &str;
}

impl Timestamped for SlotRecord {
    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

impl Timestamped for VisitRecord {
    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}
