//! Rate table caching keyed by base currency.

use chrono::Duration;
use dashmap::DashMap;
use ratebridge_common::{is_within, now, Currency, Timestamp};
use tracing::debug;

use crate::table::RateTable;

/// Cached table entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    table: RateTable,
    cached_at: Timestamp,
}

impl CacheEntry {
    fn new(table: RateTable) -> Self {
        Self {
            table,
            cached_at: now(),
        }
    }

    fn is_fresh(&self, max_age: Duration) -> bool {
        is_within(self.cached_at, max_age)
    }
}

/// Per-base-currency rate cache.
///
/// Entries are never evicted on their own. Staleness is decided by the
/// caller through [`RateCache::is_fresh`]; only [`RateCache::clear`] drops
/// entries.
pub struct RateCache {
    cache: DashMap<Currency, CacheEntry>,
}

impl RateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Get the cached table for `base`, fresh or not.
    pub fn get(&self, base: &Currency) -> Option<RateTable> {
        self.cache.get(base).map(|entry| entry.table.clone())
    }

    /// Whether an entry for `base` exists and is younger than `max_age`.
    pub fn is_fresh(&self, base: &Currency, max_age: Duration) -> bool {
        self.cache
            .get(base)
            .map(|entry| entry.is_fresh(max_age))
            .unwrap_or(false)
    }

    /// Get the table for `base` only if it is fresh.
    pub fn get_fresh(&self, base: &Currency, max_age: Duration) -> Option<RateTable> {
        match self.cache.get(base) {
            Some(entry) if entry.is_fresh(max_age) => {
                debug!(base = %base, "Cache hit");
                Some(entry.table.clone())
            }
            Some(_) => {
                debug!(base = %base, "Cache entry stale");
                None
            }
            None => {
                debug!(base = %base, "Cache miss");
                None
            }
        }
    }

    /// Store a table, replacing any previous entry for `base`.
    pub fn put(&self, base: &Currency, table: RateTable) {
        self.cache.insert(base.clone(), CacheEntry::new(table));
    }

    /// Clear all cached tables.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Get the number of entries in cache.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Get cache statistics against a freshness window.
    pub fn stats(&self, max_age: Duration) -> CacheStats {
        let total = self.cache.len();
        let fresh = self
            .cache
            .iter()
            .filter(|e| e.value().is_fresh(max_age))
            .count();

        CacheStats {
            total_entries: total,
            fresh_entries: fresh,
            stale_entries: total - fresh,
        }
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub stale_entries: usize,
}
