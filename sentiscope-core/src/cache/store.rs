//! In-memory result store with lazy TTL expiration

use crate::analysis::AnalysisResult;
use crate::cache::{config::CacheConfig, entry::CacheEntry, key::CacheKey, types::CacheStats};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// Process-wide mapping from key to (value, expiry)
///
/// This implementation provides:
/// - Thread-safe async access via RwLock; every read or write of a key happens
///   under the lock, so readers never see a partially written entry
/// - Lazy expiration: an expired entry is evicted by the lookup that finds it
/// - Replace-on-insert: at most one entry per key
///
/// Construct once at startup and share it behind an `Arc`.
pub struct CacheStore {
    config: CacheConfig,
    inner: RwLock<StoreInner>,
}

struct StoreInner {
    entries: HashMap<CacheKey, CacheEntry>,
    stats: CacheStats,
}

impl CacheStore {
    /// Create an empty store
    pub fn new(config: CacheConfig) -> Self {
        info!("Initializing result cache with config: {:?}", config);

        Self {
            config,
            inner: RwLock::new(StoreInner {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Return the stored value if it exists and has not expired
    ///
    /// An expired entry found here is removed before returning `None`.
    pub async fn lookup(&self, key: &CacheKey) -> Option<AnalysisResult> {
        let now = Instant::now();
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let metrics = self.config.track_stats;

        let valid = match inner.entries.get_mut(key) {
            Some(entry) if entry.is_valid_at(now) => {
                entry.mark_accessed();
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!("Cache entry expired: {}", key);
                inner.entries.remove(key);
                if metrics {
                    inner.stats.evictions_ttl += 1;
                }
                None
            }
            None => None,
        };

        if metrics {
            if valid.is_some() {
                inner.stats.hits += 1;
            } else {
                inner.stats.misses += 1;
            }
            inner.stats.entries = inner.entries.len();
        }

        match &valid {
            Some(_) => debug!("Cache hit: {}", key),
            None => debug!("Cache miss: {}", key),
        }

        valid
    }

    /// Like [`lookup`](Self::lookup) but leaves counters and expired entries alone
    pub async fn peek(&self, key: &CacheKey) -> Option<AnalysisResult> {
        let now = Instant::now();
        let inner = self.inner.read().await;

        inner
            .entries
            .get(key)
            .filter(|entry| entry.is_valid_at(now))
            .map(|entry| entry.value.clone())
    }

    /// Store `value` under `key` for `ttl`, replacing any previous entry
    ///
    /// A zero TTL stores an entry that no lookup will ever return.
    pub async fn insert(&self, key: CacheKey, value: AnalysisResult, ttl: Duration) {
        let entry = CacheEntry::new(key.clone(), value, ttl, Instant::now());
        let mut inner = self.inner.write().await;

        if inner.entries.insert(key.clone(), entry).is_some() {
            debug!("Replaced cache entry: {} (ttl {:?})", key, ttl);
        } else {
            debug!("Inserted cache entry: {} (ttl {:?})", key, ttl);
        }

        if self.config.track_stats {
            inner.stats.insertions += 1;
            inner.stats.entries = inner.entries.len();
        }
    }

    /// Store `value` with the configured TTL (jitter applied)
    pub async fn insert_default(&self, key: CacheKey, value: AnalysisResult) {
        let ttl = self.config.entry_ttl();
        self.insert(key, value, ttl).await
    }

    /// Remove the entry for `key`; returns whether one was present
    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        let mut inner = self.inner.write().await;

        let removed = inner.entries.remove(key).is_some();
        if removed {
            debug!("Invalidated cache entry: {}", key);
            if self.config.track_stats {
                inner.stats.invalidations += 1;
                inner.stats.entries = inner.entries.len();
            }
        }

        removed
    }

    /// Drop every entry
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;

        let count = inner.entries.len();
        inner.entries.clear();
        if self.config.track_stats {
            inner.stats.invalidations += count as u64;
            inner.stats.entries = 0;
        }

        info!("Cleared {} entries from cache", count);
    }

    /// Remove all expired entries; returns how many were dropped
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.write().await;

        let before = inner.entries.len();
        inner.entries.retain(|_, entry| entry.is_valid_at(now));
        let removed = before - inner.entries.len();

        if self.config.track_stats {
            inner.stats.evictions_ttl += removed as u64;
            inner.stats.entries = inner.entries.len();
        }

        if removed > 0 {
            debug!("Purged {} expired entries", removed);
        }

        removed
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        let mut stats = inner.stats.clone();
        stats.entries = inner.entries.len();
        stats
    }

    /// Number of stored entries, expired ones included until evicted
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    /// Start the periodic sweep if the configuration asks for it
    pub fn spawn_sweeper(self: Arc<Self>) -> Option<JoinHandle<()>> {
        let interval = self.config.sweep_interval?;
        info!("Starting cache sweep task (interval: {:?})", interval);

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                self.purge_expired().await;
            }
        }))
    }
}
