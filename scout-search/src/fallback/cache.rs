//! In-memory TTL store used as the last resort of a fallback chain.
//!
//! Entries are keyed by `(cache_key, provider_index)` and hold the value
//! serialised as JSON so that one store can serve chains of any result
//! type. Uses [`moka`] for async-friendly storage with automatic expiry;
//! reads additionally check the entry timestamp so an entry is never
//! returned past its TTL, even before moka has evicted it.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default maximum number of cached chain results.
pub const DEFAULT_MAX_ENTRIES: u64 = 1_000;

/// Composite cache key: caller key + index of the operation that produced the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    key: String,
    provider_index: usize,
}

/// A stored chain result. Entries are immutable; writers replace them wholesale.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached value, serialised.
    pub data: serde_json::Value,
    /// When the entry was written.
    pub stored_at: Instant,
    /// Label of the operation that produced the value.
    pub provider_label: String,
}

/// Process-wide TTL store shared by fallback executors.
///
/// Cloning is cheap; clones share the same underlying storage.
#[derive(Clone)]
pub struct TtlCache {
    inner: Cache<CacheKey, Arc<CacheEntry>>,
    ttl: Duration,
}

impl fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

impl TtlCache {
    /// Create a store whose entries expire `ttl` after being written.
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self { inner, ttl }
    }

    /// The fixed time-to-live of every entry.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a raw entry. Returns `None` on a miss or if the entry has expired.
    pub async fn get(&self, key: &str, provider_index: usize) -> Option<Arc<CacheEntry>> {
        let cache_key = CacheKey {
            key: key.to_string(),
            provider_index,
        };
        let entry = self.inner.get(&cache_key).await?;
        if entry.stored_at.elapsed() >= self.ttl {
            self.inner.invalidate(&cache_key).await;
            return None;
        }
        Some(entry)
    }

    /// Look up an entry and decode it into `T`, returning the value and its provider label.
    pub async fn get_typed<T: DeserializeOwned>(
        &self,
        key: &str,
        provider_index: usize,
    ) -> Option<(T, String)> {
        let entry = self.get(key, provider_index).await?;
        match serde_json::from_value(entry.data.clone()) {
            Ok(data) => Some((data, entry.provider_label.clone())),
            Err(err) => {
                tracing::warn!(key, provider_index, error = %err, "cached entry has unexpected shape");
                None
            }
        }
    }

    /// Store `data` for `(key, provider_index)`, replacing any previous entry.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        provider_index: usize,
        provider_label: &str,
        data: &T,
    ) {
        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, error = %err, "result not cacheable");
                return;
            }
        };
        let entry = Arc::new(CacheEntry {
            data: value,
            stored_at: Instant::now(),
            provider_label: provider_label.to_string(),
        });
        self.inner
            .insert(
                CacheKey {
                    key: key.to_string(),
                    provider_index,
                },
                entry,
            )
            .await;
    }

    /// Evict expired entries.
    pub async fn sweep(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Spawn a background task that sweeps every `interval` until `cancel` fires.
    pub fn spawn_sweeper(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        cache.sweep().await;
                        tracing::trace!(entries = cache.entry_count(), "cache sweep finished");
                    }
                }
            }
        })
    }
}
