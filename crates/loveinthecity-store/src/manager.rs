//! Prefixed, versioned key-value store with TTL and a read cache.
//!
//! [`StorageManager`] wraps every value in a [`StoredItem`] envelope
//! (timestamp, optional TTL, schema version), persists it under a
//! namespaced key, and keeps a [`moka`] read cache in front of the
//! backend. Mutations notify per-key watchers synchronously, after the
//! cache is updated.
//!
//! ## Failure policy
//!
//! No operation here returns a `Result` or panics: a failing backend makes
//! `set`/`remove`/`clear` return `false` and reads return `None`, with the
//! cause logged. A failed write leaves both the cache and the backing store
//! unchanged.
//!
//! ## Expiry
//!
//! TTL is evaluated lazily at read time, on both cache hits and backing
//! reads; an expired entry is deleted on read and treated as absent. There
//! is no background sweep.

use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{MemoryBackend, NullBackend, SqliteBackend, StorageBackend};
use crate::clock::{Clock, SystemClock};
use crate::error::StoreResult;
use crate::watch::{WatchHandle, WatchRegistry};

/// Namespace prefix applied to every persisted key.
pub const STORAGE_PREFIX: &str = "loveinthecity_";

/// Schema version stamped into every envelope at write time.
pub const STORAGE_VERSION: u32 = 1;

/// Maximum number of envelopes held in the read cache.
const CACHE_CAPACITY: u64 = 10_000;

// ═══════════════════════════════════════════════════════════════════════
//  Envelope
// ═══════════════════════════════════════════════════════════════════════

/// Envelope persisted for every key.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StoredItem<T> {
    /// The caller's value, opaque to the store.
    pub data: T,
    /// Write time, epoch milliseconds.
    pub timestamp: i64,
    /// Optional max age in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ttl: Option<u64>,
    /// Schema version tag.
    pub version: u32,
}

impl<T> StoredItem<T> {
    /// Whether the item's TTL has elapsed as of `now_millis`.
    pub fn is_expired(&self, now_millis: i64) -> bool {
        self.ttl
            .map(|ttl| now_millis.saturating_sub(self.timestamp) > ttl as i64)
            .unwrap_or(false)
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Cache stats
// ═══════════════════════════════════════════════════════════════════════

/// Hit/miss counters for the read cache.
#[derive(Debug, Default)]
struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 {
            return 0.0;
        }
        self.hits() as f64 / total as f64
    }
}

/// Snapshot returned by [`StorageManager::stats`].
#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    /// Number of namespaced items in the backing store.
    pub item_count: usize,
    /// Byte-length sum of namespaced keys and raw values.
    pub size_bytes: usize,
    /// Read-cache hits since creation.
    pub cache_hits: u64,
    /// Read-cache misses since creation.
    pub cache_misses: u64,
    /// Hit rate between 0.0 and 1.0.
    pub cache_hit_rate: f64,
}

/// A single operation for [`StorageManager::batch`].
#[derive(Debug, Clone)]
pub enum BatchOp {
    /// Store `value` under `key` (no TTL).
    Set { key: String, value: Value },
    /// Remove `key`.
    Remove { key: String },
}

// ═══════════════════════════════════════════════════════════════════════
//  StorageManager
// ═══════════════════════════════════════════════════════════════════════

/// Durable, prefixed, versioned key-value store with per-item TTL, an
/// in-process read cache, and synchronous change notifications.
///
/// One instance is shared per process (constructed once and handed to
/// consumers, typically behind an `Arc`); any component may read or write
/// any key, so callers namespace logical keys by convention.
pub struct StorageManager {
    backend: Box<dyn StorageBackend>,
    cache: Cache<String, StoredItem<Value>>,
    stats: CacheStats,
    watchers: WatchRegistry,
    clock: Arc<dyn Clock>,
    init: Once,
}

impl StorageManager {
    /// Create a manager over the given backend with the system clock.
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock))
    }

    /// Create a manager with an explicit clock (tests use [`ManualClock`]).
    ///
    /// [`ManualClock`]: crate::clock::ManualClock
    pub fn with_clock(backend: Box<dyn StorageBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            cache: Cache::builder().max_capacity(CACHE_CAPACITY).build(),
            stats: CacheStats::default(),
            watchers: WatchRegistry::new(),
            clock,
            init: Once::new(),
        }
    }

    /// Open a durable manager backed by SQLite at `path`.
    pub fn open(path: impl AsRef<std::path::Path>) -> StoreResult<Self> {
        Ok(Self::new(Box::new(SqliteBackend::open(path)?)))
    }

    /// Ephemeral manager over an in-memory map.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    /// Manager for an environment without any backing store; every
    /// operation degrades to a failure/absent return.
    pub fn detached() -> Self {
        Self::new(Box::new(NullBackend))
    }

    /// The clock this manager stamps writes with.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ── public operations ────────────────────────────────────────────

    /// Store `value` under `key`, optionally expiring after `ttl` millis.
    ///
    /// Returns `false` (leaving cache, backing store, and watchers
    /// untouched) if serialization or the backend write fails.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<u64>) -> bool {
        self.ensure_initialized();

        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(err) => {
                warn!(key, %err, "failed to serialize value");
                return false;
            }
        };

        let item = StoredItem {
            data,
            timestamp: self.clock.now_millis(),
            ttl,
            version: STORAGE_VERSION,
        };
        self.write_item(key, item)
    }

    /// Retrieve the value stored under `key`.
    ///
    /// Returns `None` for absent, expired (deleted on read), corrupt, or
    /// type-mismatched entries.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get_value(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(err) => {
                warn!(key, %err, "stored value did not match requested type");
                None
            }
        }
    }

    /// Like [`get`](Self::get), falling back to `default` when absent.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Delete `key` from the backing store and cache, notifying watchers
    /// with `None`. Returns `false` if the backend delete fails.
    pub fn remove(&self, key: &str) -> bool {
        self.ensure_initialized();

        if let Err(err) = self.backend.remove_item(&self.full_key(key)) {
            warn!(key, %err, "failed to remove item");
            return false;
        }
        self.cache.invalidate(key);
        self.watchers.notify(key, None);
        debug!(key, "item removed");
        true
    }

    /// Whether a live (non-expired) value exists under `key`.
    pub fn has(&self, key: &str) -> bool {
        self.get_value(key).is_some()
    }

    /// Remove every namespaced key and empty the cache. Keys outside the
    /// namespace are untouched, and per-key watchers are not notified.
    ///
    /// Idempotent: clearing an already-empty store succeeds.
    pub fn clear(&self) -> bool {
        self.ensure_initialized();

        let keys = match self.backend.keys() {
            Ok(keys) => keys,
            Err(err) => {
                warn!(%err, "failed to list keys for clear");
                return false;
            }
        };

        let mut ok = true;
        for key in keys.iter().filter(|k| k.starts_with(STORAGE_PREFIX)) {
            if let Err(err) = self.backend.remove_item(key) {
                warn!(key, %err, "failed to remove item during clear");
                ok = false;
            }
        }
        self.cache.invalidate_all();
        debug!("storage cleared");
        ok
    }

    /// All logical (prefix-stripped) keys currently in the backing store.
    pub fn keys(&self) -> Vec<String> {
        self.ensure_initialized();

        self.backend
            .keys()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|k| k.strip_prefix(STORAGE_PREFIX).map(str::to_string))
            .collect()
    }

    /// Byte-length sum of namespaced keys and their raw stored values.
    pub fn size_bytes(&self) -> usize {
        self.ensure_initialized();

        let Ok(keys) = self.backend.keys() else {
            return 0;
        };
        keys.iter()
            .filter(|k| k.starts_with(STORAGE_PREFIX))
            .map(|key| {
                let value_len = self
                    .backend
                    .get_item(key)
                    .ok()
                    .flatten()
                    .map_or(0, |v| v.len());
                key.len() + value_len
            })
            .sum()
    }

    /// Storage and cache counters.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            item_count: self.keys().len(),
            size_bytes: self.size_bytes(),
            cache_hits: self.stats.hits(),
            cache_misses: self.stats.misses(),
            cache_hit_rate: self.stats.hit_rate(),
        }
    }

    /// Shallow-merge `updates` onto the existing object under `key` (or an
    /// empty object if absent) and store the result without a TTL.
    ///
    /// Returns the merged value, or `None` if `updates` is not a JSON
    /// object or the write fails.
    pub fn merge(&self, key: &str, updates: Value) -> Option<Value> {
        self.ensure_initialized();

        let Value::Object(updates) = updates else {
            warn!(key, "merge requires a JSON object");
            return None;
        };

        let mut base = match self.get_value(key) {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        for (field, value) in updates {
            base.insert(field, value);
        }

        let merged = Value::Object(base);
        self.set(key, &merged, None).then_some(merged)
    }

    /// Register `callback` to run with the new value (or `None` on removal)
    /// every time `key` changes via [`set`](Self::set) or
    /// [`remove`](Self::remove).
    pub fn watch(
        &self,
        key: &str,
        callback: impl Fn(Option<&Value>) + Send + Sync + 'static,
    ) -> WatchHandle {
        self.ensure_initialized();
        self.watchers.subscribe(key, Arc::new(callback))
    }

    /// Apply a sequence of set/remove operations; `true` only if all
    /// succeed.
    pub fn batch(&self, ops: Vec<BatchOp>) -> bool {
        let count = ops.len();
        let mut ok = true;
        for op in ops {
            ok &= match op {
                BatchOp::Set { key, value } => self.set(&key, &value, None),
                BatchOp::Remove { key } => self.remove(&key),
            };
        }
        debug!(count, ok, "batch applied");
        ok
    }

    /// Snapshot of every live key and its value.
    pub fn export(&self) -> serde_json::Map<String, Value> {
        let mut out = serde_json::Map::new();
        for key in self.keys() {
            if let Some(value) = self.get_value(&key) {
                out.insert(key, value);
            }
        }
        out
    }

    /// Store every entry of `data`; `true` only if all writes succeed.
    pub fn import(&self, data: serde_json::Map<String, Value>) -> bool {
        let mut ok = true;
        for (key, value) in data {
            ok &= self.set(&key, &value, None);
        }
        ok
    }

    // ── internals ────────────────────────────────────────────────────

    fn full_key(&self, key: &str) -> String {
        format!("{STORAGE_PREFIX}{key}")
    }

    /// One-time cache seeding from the backing store; idempotent and
    /// performed at most once per manager (which is once per process for
    /// the shared instance).
    fn ensure_initialized(&self) {
        self.init.call_once(|| self.seed_cache());
    }

    fn seed_cache(&self) {
        let keys = match self.backend.keys() {
            Ok(keys) => keys,
            Err(err) => {
                warn!(%err, "backing store unavailable; starting with empty cache");
                return;
            }
        };

        let mut seeded = 0usize;
        for full_key in keys.iter().filter(|k| k.starts_with(STORAGE_PREFIX)) {
            let Some(key) = full_key.strip_prefix(STORAGE_PREFIX) else {
                continue;
            };
            if let Some(item) = self.read_backing(key) {
                self.cache.insert(key.to_string(), item);
                seeded += 1;
            }
        }
        debug!(items = seeded, "storage cache initialized");
    }

    /// Read and parse the raw envelope under `key`, applying delete-on-read
    /// expiry. Corrupt payloads are logged and treated as absent.
    fn read_backing(&self, key: &str) -> Option<StoredItem<Value>> {
        let full_key = self.full_key(key);

        let raw = match self.backend.get_item(&full_key) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(key, %err, "failed to read item");
                return None;
            }
        };

        let item: StoredItem<Value> = match serde_json::from_str(&raw) {
            Ok(item) => item,
            Err(err) => {
                warn!(key, %err, "corrupt stored payload; treating as absent");
                return None;
            }
        };

        if item.is_expired(self.clock.now_millis()) {
            debug!(key, "item expired");
            if let Err(err) = self.backend.remove_item(&full_key) {
                warn!(key, %err, "failed to delete expired item");
            }
            return None;
        }

        Some(item)
    }

    /// Cache-first read of the live value under `key`.
    fn get_value(&self, key: &str) -> Option<Value> {
        self.ensure_initialized();

        if let Some(item) = self.cache.get(key) {
            if item.is_expired(self.clock.now_millis()) {
                debug!(key, "cached item expired");
                if let Err(err) = self.backend.remove_item(&self.full_key(key)) {
                    warn!(key, %err, "failed to delete expired item");
                }
                self.cache.invalidate(key);
                self.stats.record_miss();
                return None;
            }
            self.stats.record_hit();
            return Some(item.data);
        }

        self.stats.record_miss();
        let item = self.read_backing(key)?;
        self.cache.insert(key.to_string(), item.clone());
        Some(item.data)
    }

    /// Single choke-point write: persist, then cache, then notify. Both
    /// `set` and `merge` funnel through here so the cache can never diverge
    /// from the backing store on a successful mutation.
    fn write_item(&self, key: &str, item: StoredItem<Value>) -> bool {
        let raw = match serde_json::to_string(&item) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key, %err, "failed to encode envelope");
                return false;
            }
        };

        if let Err(err) = self.backend.set_item(&self.full_key(key), &raw) {
            warn!(key, %err, "failed to persist item");
            return false;
        }

        self.cache.insert(key.to_string(), item.clone());
        self.watchers.notify(key, Some(&item.data));
        debug!(key, ttl = ?item.ttl, "item stored");
        true
    }
}

// ── tests ────────────────────────────────────────────────────────────
