// # File Record Store
//
// File-based implementation of RecordStore with atomic writes.
//
// ## Layout
//
// One JSON array per bucket inside a single data directory:
//
// ```text
// slot_data/
//   pendingSlotRequests__10.0.0.5.json
//   confirmedSlotRequests__10.0.0.5.json
//   visits__10.0.0.5.json
//   log.json            (global)
//   visits.json         (global)
// ```
//
// ## Crash Safety
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Backup: Keeps `<file>.backup` of the contents before the latest write
// - Corruption: a file that does not parse is a `Parse` error and is never
//   overwritten. The backup is one write behind, so restoring it is left to
//   an operator.

use async_trait::async_trait;
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::key::BucketKey;
use crate::locks::KeyedLocks;
use crate::traits::record_store::{Mutation, RecordStore};

/// File-based record store
///
/// Each bucket is rewritten in full on every update, under a per-bucket
/// lock, so concurrent appends to one bucket never lose a write.
///
/// # Example
///
/// ```rust,no_run
/// use slotlog_core::key::{Bucket, BucketKey};
/// use slotlog_core::state::FileRecordStore;
/// use slotlog_core::traits::RecordStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileRecordStore::new("/var/lib/slotlog").await?;
///
///     let log = BucketKey::global(Bucket::Log);
///     store.append(&log, serde_json::json!({"data": "abc", "time": "t"})).await?;
///
///     assert_eq!(store.load(&log).await?.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileRecordStore {
    dir: PathBuf,
    locks: KeyedLocks<BucketKey>,
}

impl FileRecordStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub async fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        fs::create_dir_all(&dir).await.map_err(|e| {
            Error::config(format!(
                "Failed to create data directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        tracing::debug!("File record store opened at {}", dir.display());

        Ok(Self {
            dir,
            locks: KeyedLocks::new(),
        })
    }

    /// Directory holding the bucket files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &BucketKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Read a bucket, creating it empty when missing
    ///
    /// Caller must hold the bucket lock.
    async fn read_bucket(&self, key: &BucketKey) -> Result<Vec<Value>> {
        let path = self.path_for(key);

        if !fs::try_exists(&path).await? {
            tracing::debug!("Initializing empty bucket {}", key);
            self.write_bucket(&path, &[]).await?;
            return Ok(Vec::new());
        }

        Self::read_array(&path).await.inspect_err(|err| {
            if matches!(err, Error::Parse { .. }) {
                tracing::error!(
                    "{}. Previous contents are kept in {}",
                    err,
                    Self::backup_path(&path).display()
                );
            }
        })
    }

    /// Parse a file as a JSON array
    async fn read_array(path: &Path) -> Result<Vec<Value>> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::store(format!("Failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| Error::parse(path, e.to_string()))
    }

    /// Write a bucket atomically, keeping the previous file as backup
    async fn write_bucket(&self, path: &Path, items: &[Value]) -> Result<()> {
        let json = serde_json::to_string_pretty(items)
            .map_err(|e| Error::store(format!("Failed to serialize bucket: {}", e)))?;

        let temp_path = Self::sibling(path, "tmp");
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if fs::try_exists(path).await? {
            if let Err(e) = fs::copy(path, Self::backup_path(path)).await {
                tracing::warn!("Failed to create backup of {}: {}", path.display(), e);
            }
        }

        fs::rename(&temp_path, path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::trace!("Bucket written: {} ({} records)", path.display(), items.len());
        Ok(())
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        Self::sibling(path, "backup")
    }

    /// `path` with `.suffix` appended to the full file name
    fn sibling(path: &Path, suffix: &str) -> PathBuf {
        let mut name = path.file_name().map(OsString::from).unwrap_or_default();
        name.push(".");
        name.push(suffix);
        path.with_file_name(name)
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn load(&self, key: &BucketKey) -> Result<Vec<Value>> {
        let _guard = self.locks.lock(key).await;
        self.read_bucket(key).await
    }

    async fn update<'a>(&self, key: &BucketKey, mutate: Mutation<'a>) -> Result<()> {
        let _guard = self.locks.lock(key).await;

        let mut items = self.read_bucket(key).await?;
        mutate(&mut items)?;
        self.write_bucket(&self.path_for(key), &items).await
    }

    async fn list_buckets(&self) -> Result<Vec<BucketKey>> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(key) = entry.file_name().to_str().and_then(BucketKey::from_file_name) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn flush(&self) -> Result<()> {
        // Every update is written through
        Ok(())
    }
}
