// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Caching layer for category lookups
//!
//! Category records change rarely while every populated NFT resolves its
//! category ids, so lookups are served from a TTL cache in front of any
//! [`CategoryLookup`]. Negative results are cached too: a code that matched
//! nothing keeps matching nothing until the entry expires.

use std::{
    fmt,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use shared_types::{CategoryCode, CategoryId};
use source_client::{CategoryLookup, CategoryRecord, SourceError};
use tracing::{debug, info, trace};

const DEFAULT_CATEGORY_CACHE_TTL_SECONDS: u64 = 300;
const DEFAULT_CATEGORY_CACHE_MAX_ENTRIES: usize = 10_000;

/// Cache key, categories are looked up by code or by stored id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategoryCacheKey {
    /// Lookup by human code
    Code(CategoryCode),
    /// Lookup by stored id
    Id(CategoryId),
}

impl fmt::Display for CategoryCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "code:{code}"),
            Self::Id(id) => write!(f, "id:{id}"),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedCategory {
    record: Option<CategoryRecord>,
    cached_at: Instant,
    access_count: u64,
}

impl CachedCategory {
    fn new(record: Option<CategoryRecord>) -> Self {
        Self {
            record,
            cached_at: Instant::now(),
            access_count: 0,
        }
    }

    fn is_valid(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() < ttl
    }

    /// Approximate recency, favouring frequently read entries
    fn last_access_time(&self) -> Instant {
        self.cached_at + Duration::from_millis(self.access_count.min(1000))
    }
}

/// [`CategoryLookup`] decorator with a TTL and LRU-bounded cache
#[derive(Debug)]
pub struct CachedCategoryLookup<L> {
    inner: L,
    entries: DashMap<CategoryCacheKey, CachedCategory>,
    ttl: Duration,
    max_entries: usize,
    stats: DashMap<&'static str, u64>,
}

impl<L: CategoryLookup> CachedCategoryLookup<L> {
    /// Wrap a lookup with default settings
    pub fn new(inner: L) -> Self {
        Self::with_settings(
            inner,
            Duration::from_secs(DEFAULT_CATEGORY_CACHE_TTL_SECONDS),
            DEFAULT_CATEGORY_CACHE_MAX_ENTRIES,
        )
    }

    /// Wrap a lookup with custom TTL and capacity
    pub fn with_settings(inner: L, ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
            ttl,
            max_entries,
            stats: DashMap::new(),
        }
    }

    /// The wrapped lookup
    pub fn inner(&self) -> &L {
        &self.inner
    }

    fn get(&self, key: &CategoryCacheKey) -> Option<Option<CategoryRecord>> {
        if let Some(mut cached) = self.entries.get_mut(key) {
            if cached.is_valid(self.ttl) {
                cached.access_count += 1;
                self.increment_stat("hits");
                trace!(%key, "category cache hit");
                return Some(cached.record.clone());
            }
            drop(cached);
            self.entries.remove(key);
            self.increment_stat("expired");
            debug!(%key, "expired category cache entry removed");
        }

        self.increment_stat("misses");
        None
    }

    fn store(&self, key: CategoryCacheKey, record: Option<CategoryRecord>) {
        if self.max_entries == 0 {
            return;
        }
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            self.evict_oldest_entry();
        }
        trace!(%key, found = record.is_some(), "stored category in cache");
        self.entries.insert(key, CachedCategory::new(record));
        self.increment_stat("stores");
    }

    /// Evict the least recently used entry
    fn evict_oldest_entry(&self) {
        let lru_key = self
            .entries
            .iter()
            .min_by_key(|item| (item.value().last_access_time(), item.value().access_count))
            .map(|item| item.key().clone());

        if let Some(key) = lru_key
            && self.entries.remove(&key).is_some()
        {
            self.increment_stat("evictions");
            info!(
                %key,
                remaining_entries = self.entries.len(),
                "evicted lru category cache entry due to capacity limit"
            );
        }
    }

    /// Remove expired entries, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, cached| cached.is_valid(self.ttl));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            *self.stats.entry("expired").or_insert(0) += removed as u64;
            debug!(removed, "cleaned up expired category cache entries");
        }
        removed
    }

    /// Drop every cached entry and statistic
    pub fn clear(&self) {
        self.entries.clear();
        self.stats.clear();
    }

    fn increment_stat(&self, key: &'static str) {
        *self.stats.entry(key).or_insert(0) += 1;
    }

    fn get_stat(&self, key: &str) -> u64 {
        self.stats.get(key).map_or(0, |v| *v)
    }

    /// Current cache statistics
    pub fn stats(&self) -> CategoryCacheStats {
        let hits = self.get_stat("hits");
        let misses = self.get_stat("misses");
        let total = hits + misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CategoryCacheStats {
            entry_count: self.entries.len(),
            hits,
            misses,
            stores: self.get_stat("stores"),
            evictions: self.get_stat("evictions"),
            expired: self.get_stat("expired"),
            hit_rate,
            max_capacity: self.max_entries,
            ttl_seconds: self.ttl.as_secs(),
        }
    }
}

impl<L: CategoryLookup> CategoryLookup for CachedCategoryLookup<L> {
    async fn find_by_code(
        &self,
        code: &CategoryCode,
    ) -> Result<Option<CategoryRecord>, SourceError> {
        let key = CategoryCacheKey::Code(code.clone());
        if let Some(cached) = self.get(&key) {
            return Ok(cached);
        }

        let record = self.inner.find_by_code(code).await?;
        if let Some(found) = &record {
            self.store(CategoryCacheKey::Id(found.id.clone()), Some(found.clone()));
        }
        self.store(key, record.clone());
        Ok(record)
    }

    async fn find_by_ids(&self, ids: &[CategoryId]) -> Result<Vec<CategoryRecord>, SourceError> {
        let mut resolved: Vec<Option<Option<CategoryRecord>>> = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for id in ids {
            let cached = self.get(&CategoryCacheKey::Id(id.clone()));
            if cached.is_none() && !missing.contains(id) {
                missing.push(id.clone());
            }
            resolved.push(cached);
        }

        if !missing.is_empty() {
            let fetched = self.inner.find_by_ids(&missing).await?;
            for id in &missing {
                let record = fetched.iter().find(|r| &r.id == id).cloned();
                self.store(CategoryCacheKey::Id(id.clone()), record);
            }
            for (slot, id) in resolved.iter_mut().zip(ids) {
                if slot.is_none() {
                    *slot = Some(fetched.iter().find(|r| &r.id == id).cloned());
                }
            }
        }

        Ok(resolved.into_iter().flatten().flatten().collect())
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCacheStats {
    /// Number of cached entries
    pub entry_count: usize,
    /// Cache hit count
    pub hits: u64,
    /// Cache miss count
    pub misses: u64,
    /// Number of entries stored
    pub stores: u64,
    /// Number of capacity evictions
    pub evictions: u64,
    /// Number of expired entries removed
    pub expired: u64,
    /// Hit rate (0.0 to 1.0)
    pub hit_rate: f64,
    /// Maximum cache capacity
    pub max_capacity: usize,
    /// TTL in seconds
    pub ttl_seconds: u64,
}
