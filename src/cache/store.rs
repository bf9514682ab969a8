//! Query result storage.
//!
//! An LRU of shaped catalog responses with per-entry expiry and a flush epoch.
//! A computation records the epoch before it reads the database and its result
//! is only stored if no flush happened in between, so a read racing a write
//! never repopulates the cache with pre-write data.

use std::future::Future;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::{counter, histogram};
use tracing::debug;

use super::config::CacheConfig;
use super::events::Epoch;
use super::keys::QueryCacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub const METRIC_HIT: &str = "lexicon_query_cache_hit_total";
pub const METRIC_MISS: &str = "lexicon_query_cache_miss_total";
pub const METRIC_EVICT: &str = "lexicon_query_cache_evict_total";
pub const METRIC_EXPIRED: &str = "lexicon_query_cache_expired_total";
pub const METRIC_FLUSH: &str = "lexicon_query_cache_flush_total";
pub const METRIC_COMPUTE_MS: &str = "lexicon_query_compute_ms";

struct CachedEntry<V> {
    value: V,
    expires_at: Instant,
}

pub struct QueryCache<V> {
    config: CacheConfig,
    entries: RwLock<LruCache<QueryCacheKey, CachedEntry<V>>>,
    epoch: AtomicU64,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = config.max_entries_non_zero();
        Self {
            config,
            entries: RwLock::new(LruCache::new(capacity)),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn current_epoch(&self) -> Epoch {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Look up a live entry. Expired entries are dropped on the way.
    pub fn get(&self, key: &QueryCacheKey) -> Option<V> {
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        match entries.get(key) {
            None => return None,
            Some(entry) if entry.expires_at > Instant::now() => return Some(entry.value.clone()),
            Some(_) => {}
        }

        entries.pop(key);
        counter!(METRIC_EXPIRED).increment(1);
        None
    }

    /// Store `value` unless a flush happened since `epoch` was observed.
    ///
    /// Returns whether the value was stored.
    pub fn insert_if_current(&self, key: QueryCacheKey, value: V, epoch: Epoch) -> bool {
        self.insert_with_ttl(key, value, epoch, self.config.ttl())
    }

    fn insert_with_ttl(&self, key: QueryCacheKey, value: V, epoch: Epoch, ttl: Duration) -> bool {
        let mut entries = rw_write(&self.entries, SOURCE, "insert");
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!(key = %key, observed_epoch = epoch, "Discarding result computed before a flush");
            return false;
        }

        let entry = CachedEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        if let Some((evicted, _)) = entries.push(key.clone(), entry) {
            if evicted != key {
                counter!(METRIC_EVICT).increment(1);
            }
        }
        true
    }

    /// Drop every entry and advance the epoch.
    ///
    /// The epoch moves while the write lock is held, so an insert either lands
    /// before the clear or sees the new epoch and is discarded.
    pub fn flush_all(&self) -> Epoch {
        let mut entries = rw_write(&self.entries, SOURCE, "flush_all");
        let next = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let dropped = entries.len();
        entries.clear();
        counter!(METRIC_FLUSH).increment(1);
        debug!(epoch = next, dropped, "Query cache flushed");
        next
    }

    /// Return the cached value for `key` or compute and store it.
    ///
    /// When the cache is disabled `compute` runs every time and nothing is
    /// stored. Errors from `compute` are never cached.
    pub async fn remember<F, Fut, E>(&self, key: QueryCacheKey, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if !self.config.is_enabled() {
            return compute().await;
        }

        if let Some(value) = self.get(&key) {
            counter!(METRIC_HIT).increment(1);
            return Ok(value);
        }
        counter!(METRIC_MISS).increment(1);

        let epoch = self.current_epoch();
        let started_at = Instant::now();
        let value = compute().await?;
        histogram!(METRIC_COMPUTE_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        self.insert_if_current(key, value.clone(), epoch);
        Ok(value)
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
