//! Byte-budgeted LRU cache

use super::CacheStats;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, trace};

/// Default byte budget (100 MB)
pub const DEFAULT_MAX_CACHE_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    last_access: Instant,
    /// Monotonic access sequence, breaks ties between equal `Instant`s
    access_seq: u64,
    size: u64,
}

#[derive(Debug)]
struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    current_size: u64,
    hits: u64,
    misses: u64,
    next_seq: u64,
}

impl<V> CacheInner<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            current_size: 0,
            hits: 0,
            misses: 0,
            next_seq: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn evict_lru(&mut self) -> Option<(String, u64)> {
        let key = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.last_access, entry.access_seq))
            .map(|(key, _)| key.clone())?;
        let entry = self.entries.remove(&key)?;
        self.current_size -= entry.size;
        Some((key, entry.size))
    }
}

/// Thread-safe LRU cache with a byte budget instead of an entry count.
///
/// Every entry carries a caller-declared size. `put` evicts least recently
/// accessed entries until the new entry fits, so `current_size` never
/// exceeds `max_size` once `put` returns, provided the entry itself fits.
/// An entry larger than the whole budget empties the cache and is stored anyway.
pub struct SmartCacheManager<V> {
    max_size: u64,
    inner: Mutex<CacheInner<V>>,
}

impl<V: Clone> Default for SmartCacheManager<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CACHE_BYTES)
    }
}

impl<V: Clone> SmartCacheManager<V> {
    pub fn new(max_size: u64) -> Self {
        Self {
            max_size,
            inner: Mutex::new(CacheInner::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a value, refreshing its recency on hit
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();
        let seq = inner.tick();

        match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.last_access = Instant::now();
                entry.access_seq = seq;
                let value = entry.value.clone();
                inner.hits += 1;
                trace!(key = %key, "Cache hit");
                Some(value)
            }
            None => {
                inner.misses += 1;
                trace!(key = %key, "Cache miss");
                None
            }
        }
    }

    /// Insert or overwrite a value with the given size in bytes
    pub fn put(&self, key: &str, value: V, size: u64) {
        let mut inner = self.lock();

        if let Some(old) = inner.entries.remove(key) {
            inner.current_size -= old.size;
        }

        while inner.current_size + size > self.max_size && !inner.entries.is_empty() {
            if let Some((evicted, evicted_size)) = inner.evict_lru() {
                debug!(key = %evicted, size = evicted_size, "Evicted LRU cache entry");
            }
        }

        let seq = inner.tick();
        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                last_access: Instant::now(),
                access_seq: seq,
                size,
            },
        );
        inner.current_size += size;
    }

    /// Remove an entry, returning its value
    pub fn remove(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();
        let entry = inner.entries.remove(key)?;
        inner.current_size -= entry.size;
        Some(entry.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn current_size(&self) -> u64 {
        self.lock().current_size
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Hit rate as a percentage, 0 before any lookup
    pub fn get_hit_rate(&self) -> f64 {
        let inner = self.lock();
        hit_rate(inner.hits, inner.misses)
    }

    pub fn get_stats(&self) -> CacheStats {
        let inner = self.lock();
        let utilization = if self.max_size == 0 {
            0.0
        } else {
            inner.current_size as f64 / self.max_size as f64 * 100.0
        };

        CacheStats {
            entries: inner.entries.len(),
            current_size: inner.current_size,
            max_size: self.max_size,
            utilization,
            hits: inner.hits,
            misses: inner.misses,
            hit_rate: hit_rate(inner.hits, inner.misses),
        }
    }

    /// Drop all entries and reset counters
    pub fn clear(&self) {
        let mut inner = self.lock();
        *inner = CacheInner::new();
    }
}

fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries_size(cache: &SmartCacheManager<String>) -> u64 {
        cache.lock().entries.values().map(|e| e.size).sum()
    }

    #[test]
    fn test_put_evicts_oldest_when_over_budget() {
        let cache = SmartCacheManager::new(1000);
        cache.put("a", "A".to_string(), 600);
        cache.put("b", "B".to_string(), 600);

        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("b").as_deref(), Some("B"));
        assert_eq!(cache.current_size(), 600);
    }

    #[test]
    fn test_get_refreshes_recency() {
        let cache = SmartCacheManager::new(1000);
        cache.put("a", "A".to_string(), 400);
        cache.put("b", "B".to_string(), 400);

        // a becomes most recently used, so b is evicted next
        assert!(cache.get("a").is_some());
        cache.put("c", "C".to_string(), 400);

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn test_overwrite_replaces_size() {
        let cache = SmartCacheManager::new(1000);
        cache.put("a", "A".to_string(), 300);
        cache.put("a", "A2".to_string(), 500);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.current_size(), 500);
        assert_eq!(cache.get("a").as_deref(), Some("A2"));
    }

    #[test]
    fn test_size_invariant_over_many_puts() {
        let cache = SmartCacheManager::new(1000);
        for i in 0..200u64 {
            let size = (i * 37) % 300 + 1;
            cache.put(&format!("k{}", i % 17), format!("v{i}"), size);
            assert!(cache.current_size() <= cache.max_size());
            assert_eq!(cache.current_size(), entries_size(&cache));
        }
    }

    #[test]
    fn test_oversized_entry_is_stored_alone() {
        let cache = SmartCacheManager::new(100);
        cache.put("small", "s".to_string(), 10);
        cache.put("huge", "h".to_string(), 500);

        assert_eq!(cache.len(), 1);
        assert!(cache.contains("huge"));
        assert_eq!(cache.current_size(), 500);
    }

    #[test]
    fn test_hit_rate_and_stats() {
        let cache = SmartCacheManager::new(1000);
        assert_eq!(cache.get_hit_rate(), 0.0);

        cache.put("a", "A".to_string(), 250);
        cache.get("a");
        cache.get("a");
        cache.get("a");
        cache.get("missing");

        let stats = cache.get_stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.current_size, 250);
        assert_eq!(stats.max_size, 1000);
        assert_eq!(stats.utilization, 25.0);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 75.0);
        assert_eq!(cache.get_hit_rate(), 75.0);
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = SmartCacheManager::new(1000);
        cache.put("a", "A".to_string(), 100);
        cache.put("b", "B".to_string(), 200);

        assert_eq!(cache.remove("a").as_deref(), Some("A"));
        assert_eq!(cache.current_size(), 200);
        assert!(cache.remove("a").is_none());

        cache.get("b");
        cache.clear();
        let stats = cache.get_stats();
        assert!(cache.is_empty());
        assert_eq!(stats.current_size, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }
}
