//! Storage keys
//!
//! Every stored sequence is addressed by a [`BucketKey`]: a [`Scope`]
//! (one client, or the process-wide global scope) plus a [`Bucket`].
//!
//! Client scopes are namespaced by a [`ClientKey`], a sanitized form of
//! the request's originating address. The key is only a partitioning
//! label; clients behind the same proxy share one.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Sanitized identifier derived from a client's network address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientKey(String);

impl ClientKey {
    /// Derive a key from the forwarded-for header and the peer address
    ///
    /// The first entry of `forwarded_for` wins when it is non-empty,
    /// otherwise the direct peer address is used.
    ///
    /// # Errors
    ///
    /// [`Error::MissingAddress`] when neither source yields an address.
    pub fn derive(forwarded_for: Option<&str>, peer: Option<&str>) -> Result<Self> {
        let forwarded = forwarded_for
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|first| !first.is_empty());

        let address = forwarded
            .or_else(|| peer.map(str::trim).filter(|p| !p.is_empty()))
            .ok_or(Error::MissingAddress)?;

        Ok(Self::sanitize(address))
    }

    /// Replace every character outside `[A-Za-z0-9_.-]` with `_`
    pub fn sanitize(address: &str) -> Self {
        let cleaned = address
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Self(cleaned)
    }

    /// The sanitized key text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClientKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Who a bucket belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "key", rename_all = "snake_case")]
pub enum Scope {
    /// Buckets partitioned by client address
    Client(ClientKey),
    /// Process-wide buckets shared by every client
    Global,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Client(key) => write!(f, "client:{key}"),
            Scope::Global => f.write_str("global"),
        }
    }
}

/// Named sequence within a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// Slot requests awaiting confirmation
    Pending,
    /// Slot requests promoted by a matching confirmation
    Confirmed,
    /// Access log entries
    Visits,
    /// Raw request log (global scope only)
    Log,
}

impl Bucket {
    /// All buckets, in a stable order
    pub const ALL: [Bucket; 4] = [Bucket::Pending, Bucket::Confirmed, Bucket::Visits, Bucket::Log];

    /// Stem used when persisting this bucket
    pub fn stem(&self) -> &'static str {
        match self {
            Bucket::Pending => "pendingSlotRequests",
            Bucket::Confirmed => "confirmedSlotRequests",
            Bucket::Visits => "visits",
            Bucket::Log => "log",
        }
    }

    /// Reverse of [`Bucket::stem`]
    pub fn from_stem(stem: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.stem() == stem)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Bucket::Pending => "pending",
            Bucket::Confirmed => "confirmed",
            Bucket::Visits => "visits",
            Bucket::Log => "log",
        };
        f.write_str(name)
    }
}

/// Full address of one stored sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketKey {
    pub scope: Scope,
    pub bucket: Bucket,
}

impl BucketKey {
    /// Bucket within a client's scope
    pub fn client(key: &ClientKey, bucket: Bucket) -> Self {
        Self {
            scope: Scope::Client(key.clone()),
            bucket,
        }
    }

    /// Bucket within the global scope
    pub fn global(bucket: Bucket) -> Self {
        Self {
            scope: Scope::Global,
            bucket,
        }
    }

    /// Flat file name for this bucket
    ///
    /// Client buckets are `{stem}__{key}.json`, global ones `{stem}.json`.
    /// Sanitized keys never contain a path separator.
    pub fn file_name(&self) -> String {
        match &self.scope {
            Scope::Client(key) => format!("{}__{}.json", self.bucket.stem(), key),
            Scope::Global => format!("{}.json", self.bucket.stem()),
        }
    }

    /// Reverse of [`BucketKey::file_name`]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(".json")?;
        match stem.split_once("__") {
            Some((bucket, key)) if !key.is_empty() => {
                let bucket = Bucket::from_stem(bucket)?;
                // Anything a sanitizer would rewrite cannot be one of ours
                let client = ClientKey::sanitize(key);
                (client.as_str() == key).then(|| Self::client(&client, bucket))
            }
            Some(_) => None,
            None => Bucket::from_stem(stem).map(Self::global),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scope, self.bucket)
    }
}
