//! In-process caching for the extraction pipeline
//!
//! Two caches with different eviction models:
//!
//! - [`SmartCacheManager`]: byte-budgeted LRU, eviction driven by access order
//! - [`ResultCache`]: TTL cache of extraction results keyed by file content identity
//!
//! Both are best-effort. A failure to compute a key or a stale entry is a miss,
//! never an error surfaced to the caller.

pub mod result_cache;
pub mod smart_cache;

pub use result_cache::*;
pub use smart_cache::*;

use serde::Serialize;

/// Cache statistics for the byte-budgeted LRU cache
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub current_size: u64,
    pub max_size: u64,
    /// Percentage of the byte budget in use
    pub utilization: f64,
    pub hits: u64,
    pub misses: u64,
    /// Percentage of lookups that were hits
    pub hit_rate: f64,
}

impl CacheStats {
    pub fn miss_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            100.0 - self.hit_rate
        }
    }
}

/// Statistics for the TTL result cache
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultCacheStats {
    pub size: usize,
    pub ttl_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            hit_rate: 80.0,
            ..Default::default()
        };
        assert!((stats.miss_rate() - 20.0).abs() < f64::EPSILON);
        assert_eq!(CacheStats::default().miss_rate(), 0.0);
    }
}
