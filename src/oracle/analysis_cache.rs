//! TTL Cache for Analysis Results
//!
//! Memoizes token and wallet analyses keyed by address.
//!
//! ## Features
//! - Moka-based in-memory cache with automatic TTL expiration
//! - Single-flight: concurrent misses for one key share a single computation
//! - Non-blocking `peek` for cache-only readers
//! - Hit/miss/update/invalidation metrics

use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Keyed TTL cache for one kind of analysis
#[derive(Clone)]
pub struct AnalysisCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    name: &'static str,
    cache: Cache<String, V>,
    metrics: Arc<Mutex<CacheMetrics>>,
    ttl_seconds: u64,
}

#[derive(Debug, Default)]
struct CacheMetrics {
    hits: u64,
    misses: u64,
    updates: u64,
    invalidations: u64,
}

impl<V> AnalysisCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// # Arguments
    /// * `name` - Label used in logs and metrics
    /// * `max_capacity` - Maximum number of entries in cache
    /// * `ttl_seconds` - Time-to-live for cache entries
    pub fn new(name: &'static str, max_capacity: u64, ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_seconds))
            .build();

        info!(
            "Initialized {} cache with max_capacity={}, ttl={}s",
            name, max_capacity, ttl_seconds
        );

        Self {
            name,
            cache,
            metrics: Arc::new(Mutex::new(CacheMetrics::default())),
            ttl_seconds,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Return the fresh entry for `key`, computing it with `init` on a miss.
    ///
    /// The flag is `true` when the value came from the cache, including when
    /// this caller waited on another caller's in-flight computation.
    pub async fn get_or_compute<F>(&self, key: &str, init: F) -> (V, bool)
    where
        F: Future<Output = V>,
    {
        let entry = self.cache.entry_by_ref(key).or_insert_with(init).await;
        let cached = !entry.is_fresh();

        let mut metrics = self.metrics.lock().await;
        if cached {
            metrics.hits += 1;
            debug!(cache = self.name, key, "Cache hit");
        } else {
            metrics.misses += 1;
            metrics.updates += 1;
            debug!(cache = self.name, key, "Cache miss, computed fresh entry");
        }

        (entry.into_value(), cached)
    }

    /// Cache-only read; never computes
    pub async fn peek(&self, key: &str) -> Option<V> {
        self.cache.get(key).await
    }

    /// Store a value directly, replacing any entry
    pub async fn insert(&self, key: String, value: V) {
        self.cache.insert(key, value).await;
        self.metrics.lock().await.updates += 1;
    }

    /// Drop the entry for `key` so the next read recomputes it
    pub async fn invalidate(&self, key: &str) {
        self.cache.invalidate(key).await;
        self.metrics.lock().await.invalidations += 1;
        debug!(cache = self.name, key, "Invalidated cache entry");
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.cache.invalidate_all();
        info!("Cleared all {} cache entries", self.name);
    }

    pub async fn get_metrics(&self) -> CacheMetricsSnapshot {
        let metrics = self.metrics.lock().await;
        let total_requests = metrics.hits + metrics.misses;
        let hit_rate = if total_requests > 0 {
            metrics.hits as f64 / total_requests as f64
        } else {
            0.0
        };

        CacheMetricsSnapshot {
            hits: metrics.hits,
            misses: metrics.misses,
            updates: metrics.updates,
            invalidations: metrics.invalidations,
            hit_rate,
            entry_count: self.cache.entry_count(),
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }
}

/// Snapshot of cache metrics
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub updates: u64,
    pub invalidations: u64,
    /// 0.0-1.0
    pub hit_rate: f64,
    /// Approximate; moka updates it lazily
    pub entry_count: u64,
}
