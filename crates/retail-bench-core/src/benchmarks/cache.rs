//! Time-bounded cache of aggregated benchmark sets.
//!
//! The cache is best-effort. Callers treat every error from a
//! [`BenchmarkCache`] as a miss and carry on uncached; a concurrent miss on
//! the same key may compute the same aggregation twice, which is harmless
//! because aggregation is idempotent.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::time::Instant;

use super::records::BenchmarkType;
use super::repository::EligibleBenchmarkQuery;
use super::BenchmarkSet;
use crate::BenchmarkResult;

/// Value type stored under a [`CacheKey`].
pub type CachedBenchmarks = BenchmarkSet;

/// Aggregated benchmarks live for one hour.
pub const BENCHMARK_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Cache key: benchmark type plus a stable digest of the query that
/// characterises the record set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub benchmark_type: BenchmarkType,
    pub signature: String,
}

impl CacheKey {
    /// Keys are identical for queries that differ only in list ordering or
    /// category case, and stable across processes.
    pub fn for_query(benchmark_type: BenchmarkType, query: &EligibleBenchmarkQuery) -> Self {
        let mut canonical = query.clone();
        canonical.data_quality.sort();
        canonical.data_quality.dedup();
        canonical.sources.sort();
        canonical.sources.dedup();
        canonical.category = canonical.category.map(|c| c.trim().to_ascii_lowercase());

        let mut hasher = Sha256::new();
        hasher.update(benchmark_type.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(serde_json::to_vec(&canonical).unwrap_or_default());
        CacheKey {
            benchmark_type,
            signature: hex::encode(hasher.finalize()),
        }
    }
}

/// Key-value store with per-entry TTL.
#[async_trait]
pub trait BenchmarkCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> BenchmarkResult<Option<CachedBenchmarks>>;

    async fn set(&self, key: CacheKey, value: CachedBenchmarks, ttl: Duration) -> BenchmarkResult<()>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CachedBenchmarks,
    expires_at: Instant,
}

/// Process-local cache on a sharded concurrent map. Expired entries are
/// evicted lazily on read or by [`InMemoryBenchmarkCache::purge_expired`].
#[derive(Debug, Default)]
pub struct InMemoryBenchmarkCache {
    entries: DashMap<CacheKey, CacheEntry>,
}

impl InMemoryBenchmarkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, e| e.expires_at > now);
    }
}

#[async_trait]
impl BenchmarkCache for InMemoryBenchmarkCache {
    async fn get(&self, key: &CacheKey) -> BenchmarkResult<Option<CachedBenchmarks>> {
        let now = Instant::now();
        // The shard guard must be released before `remove_if` touches the same shard.
        let lookup = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => None,
            None => return Ok(None),
        };
        if lookup.is_none() {
            self.entries.remove_if(key, |_, e| e.expires_at <= now);
        }
        Ok(lookup)
    }

    async fn set(&self, key: CacheKey, value: CachedBenchmarks, ttl: Duration) -> BenchmarkResult<()> {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::defaults::IntelligentDefaults;
    use crate::benchmarks::records::{BenchmarkSource, DataQuality, Region};
    use chrono::{NaiveDate, Utc};

    fn query() -> EligibleBenchmarkQuery {
        EligibleBenchmarkQuery {
            is_active: true,
            data_quality: vec![DataQuality::Verified, DataQuality::Preliminary],
            region: Some(Region::National),
            sources: vec![BenchmarkSource::TradeAssociation, BenchmarkSource::GovernmentStatistics],
            min_sample_size: 0,
            not_expired_as_of: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            category: Some("Food".into()),
        }
    }

    fn sample_set() -> BenchmarkSet {
        IntelligentDefaults::builtin().all_for(BenchmarkType::CategoryAverage, Utc::now())
    }

    #[test]
    fn test_key_is_order_and_case_insensitive() {
        let a = CacheKey::for_query(BenchmarkType::CategoryAverage, &query());
        let mut q = query();
        q.sources.reverse();
        q.data_quality.reverse();
        q.category = Some("food".into());
        let b = CacheKey::for_query(BenchmarkType::CategoryAverage, &q);
        assert_eq!(a, b);
        assert_eq!(a.signature.len(), 64);
    }

    #[test]
    fn test_key_separates_benchmark_types_and_regions() {
        let a = CacheKey::for_query(BenchmarkType::CategoryAverage, &query());
        let b = CacheKey::for_query(BenchmarkType::BestPerformer, &query());
        let mut q = query();
        q.region = Some(Region::City);
        let c = CacheKey::for_query(BenchmarkType::CategoryAverage, &q);
        assert_ne!(a.signature, b.signature);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = InMemoryBenchmarkCache::new();
        let key = CacheKey::for_query(BenchmarkType::CategoryAverage, &query());
        assert!(cache.get(&key).await.unwrap().is_none());
        cache.set(key.clone(), sample_set(), BENCHMARK_CACHE_TTL).await.unwrap();
        let hit = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(hit.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = InMemoryBenchmarkCache::new();
        let key = CacheKey::for_query(BenchmarkType::CategoryAverage, &query());
        cache.set(key.clone(), sample_set(), BENCHMARK_CACHE_TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(3599)).await;
        assert!(cache.get(&key).await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get(&key).await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = InMemoryBenchmarkCache::new();
        let key = CacheKey::for_query(BenchmarkType::CategoryAverage, &query());
        cache.set(key, sample_set(), Duration::from_secs(10)).await.unwrap();
        assert_eq!(cache.len(), 1);
        tokio::time::advance(Duration::from_secs(11)).await;
        cache.purge_expired();
        assert!(cache.is_empty());
    }
}
