//! Key/value TTL store persisted as one JSON document
//!
//! The whole document is read on every lookup and rewritten on every write.
//! Reads through [`TtlStore::get`] only see fresh entries; expired entries stay
//! on disk (and visible to [`TtlStore::get_stale`]) until
//! [`TtlStore::evict_expired`] removes them.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Default time-to-live for cache entries in hours
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Errors raised while reading or writing the cache document
///
/// These never escape the public store API; they are logged and turned into
/// "absent" / `false` / `0` results.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document could not be serialized or deserialized
    #[error("Invalid cache document: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == ErrorKind::NotFound)
    }
}

/// A single cached payload and the instant it was written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// When the entry was written
    pub timestamp: DateTime<Utc>,
    /// The cached value, kept as raw JSON so one document can hold any payload type
    pub payload: Value,
}

impl CacheEntry {
    /// An entry is fresh while its age is strictly below the TTL
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.timestamp < ttl
    }
}

/// On-disk layout: `{ "<key>": { "timestamp": ..., "payload": ... } }`
pub type CacheDocument = BTreeMap<String, CacheEntry>;

/// Flat-file cache with time-based expiry
///
/// Cloning is cheap and clones share the same in-process write lock, so
/// read-modify-write cycles from one process never interleave. Writers in other
/// processes can still race (last write wins).
#[derive(Debug, Clone)]
pub struct TtlStore {
    path: PathBuf,
    ttl: Duration,
    write_lock: Arc<Mutex<()>>,
}

impl TtlStore {
    /// Creates a store backed by the given file with the default 24 hour TTL
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Overrides the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Path of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Creates the parent directory and an empty document if the file is missing.
    ///
    /// Idempotent. Failures are logged and swallowed; a broken location surfaces
    /// later as failed reads or writes.
    pub async fn ensure_initialized(&self) {
        match fs::try_exists(&self.path).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot probe cache file");
                return;
            }
        }

        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                warn!(dir = %parent.display(), error = %e, "cannot create cache directory");
                return;
            }
        }

        match fs::write(&self.path, "{}").await {
            Ok(()) => debug!(path = %self.path.display(), "initialized empty cache document"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "cannot create cache file"),
        }
    }

    /// Returns the payload for `key` if it exists and is still fresh.
    ///
    /// Missing, expired, undecodable and unreadable entries all read as `None`.
    /// Expired entries are left in place.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut document = self.load().await;
        let entry = document.remove(key)?;

        if !entry.is_fresh(Utc::now(), self.ttl) {
            debug!(key, written = %entry.timestamp, "cache entry expired");
            return None;
        }

        decode(key, entry.payload)
    }

    /// Returns the payload for `key` regardless of its age.
    ///
    /// Used as the last resort when fetching fresh data failed.
    pub async fn get_stale<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut document = self.load().await;
        let entry = document.remove(key)?;
        decode(key, entry.payload)
    }

    /// Writes `payload` under `key` stamped with the current time.
    ///
    /// Returns `false` if the payload cannot be serialized or the document
    /// cannot be written. A corrupt existing document is replaced.
    pub async fn put<T: Serialize>(&self, key: &str, payload: &T) -> bool {
        self.put_at(key, payload, Utc::now()).await
    }

    pub(crate) async fn put_at<T: Serialize>(
        &self,
        key: &str,
        payload: &T,
        timestamp: DateTime<Utc>,
    ) -> bool {
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "cannot serialize cache payload");
                return false;
            }
        };

        let _guard = self.write_lock.lock().await;
        self.ensure_initialized().await;

        let mut document = match self.read_document().await {
            Ok(document) => document,
            Err(StoreError::Json(e)) => {
                warn!(path = %self.path.display(), error = %e, "replacing corrupt cache document");
                CacheDocument::new()
            }
            Err(e) => {
                warn!(key, error = %e, "cannot read cache document for write");
                return false;
            }
        };

        document.insert(key.to_string(), CacheEntry { timestamp, payload });

        match self.write_document(&document).await {
            Ok(()) => {
                debug!(key, entries = document.len(), "cache entry written");
                true
            }
            Err(e) => {
                warn!(key, error = %e, "cannot write cache document");
                false
            }
        }
    }

    /// Removes every entry whose age is at least the TTL.
    ///
    /// The document is only rewritten when something was removed. Returns the
    /// number of removed entries, or 0 on any failure.
    pub async fn evict_expired(&self) -> usize {
        let _guard = self.write_lock.lock().await;

        let mut document = match self.read_document().await {
            Ok(document) => document,
            Err(e) if e.is_not_found() => return 0,
            Err(e) => {
                warn!(error = %e, "cannot read cache document for eviction");
                return 0;
            }
        };

        let now = Utc::now();
        let before = document.len();
        document.retain(|_, entry| entry.is_fresh(now, self.ttl));
        let removed = before - document.len();

        if removed == 0 {
            return 0;
        }

        match self.write_document(&document).await {
            Ok(()) => {
                debug!(removed, remaining = document.len(), "evicted expired cache entries");
                removed
            }
            Err(e) => {
                warn!(error = %e, "cannot write cache document after eviction");
                0
            }
        }
    }

    /// Reads the whole document, treating a missing or corrupt file as empty
    async fn load(&self) -> CacheDocument {
        match self.read_document().await {
            Ok(document) => document,
            Err(e) if e.is_not_found() => CacheDocument::new(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable cache document");
                CacheDocument::new()
            }
        }
    }

    async fn read_document(&self) -> Result<CacheDocument, StoreError> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn write_document(&self, document: &CacheDocument) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, json)
            .await
            .map_err(|e| StoreError::io(&self.path, e))
    }
}

fn decode<T: DeserializeOwned>(key: &str, payload: Value) -> Option<T> {
    match serde_json::from_value(payload) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "cached payload has unexpected shape");
            None
        }
    }
}
