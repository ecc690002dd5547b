//! TTL cache for extraction results.
//!
//! Entries are keyed by file content identity (path plus modification time),
//! so a file rewritten after its result was cached gets a fresh key and
//! naturally misses.

use super::ResultCacheStats;
use extraction_core::DistributedResult;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant, UNIX_EPOCH};
use tracing::{debug, trace};

/// Default TTL for cached results.
pub const DEFAULT_RESULT_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
struct CachedResult {
    result: DistributedResult,
    cached_at: Instant,
}

/// Thread-safe TTL cache of [`DistributedResult`]s.
///
/// Expiry is checked lazily on `get`; a stale entry is removed and reported
/// as a miss. Use [`ResultCache::purge_expired`] to sweep in bulk.
pub struct ResultCache {
    ttl: Duration,
    cache: RwLock<HashMap<String, CachedResult>>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_RESULT_TTL_SECS))
    }
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CachedResult>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CachedResult>> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Content key for a file.
    ///
    /// Hashes the path together with the modification time in nanoseconds.
    /// When the file cannot be stat'ed only the path is hashed, so two
    /// different contents behind an unreadable mtime share a key.
    pub fn get_key(file_path: &str) -> String {
        let mut hasher = DefaultHasher::new();
        file_path.hash(&mut hasher);

        let mtime = std::fs::metadata(file_path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok());

        match mtime {
            Some(mtime) => mtime.as_nanos().hash(&mut hasher),
            None => trace!(path = %file_path, "No mtime available, keying by path only"),
        }

        format!("{:016x}", hasher.finish())
    }

    /// Cached result for a file, if present and younger than the TTL
    pub fn get(&self, file_path: &str) -> Option<DistributedResult> {
        let key = Self::get_key(file_path);

        {
            let cache = self.read();
            let entry = cache.get(&key)?;
            if entry.cached_at.elapsed() < self.ttl {
                trace!(path = %file_path, "Result cache hit");
                return Some(entry.result.clone());
            }
        }

        let mut cache = self.write();
        // Re-check under the write lock, another caller may have refreshed it
        if let Some(entry) = cache.get(&key) {
            if entry.cached_at.elapsed() < self.ttl {
                return Some(entry.result.clone());
            }
            cache.remove(&key);
            debug!(path = %file_path, "Evicted expired result");
        }
        None
    }

    pub fn set(&self, file_path: &str, result: DistributedResult) {
        let key = Self::get_key(file_path);
        let mut cache = self.write();
        cache.insert(
            key,
            CachedResult {
                result,
                cached_at: Instant::now(),
            },
        );
        debug!(path = %file_path, cache_size = cache.len(), "Cached extraction result");
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let mut cache = self.write();
        let before = cache.len();
        cache.retain(|_, entry| entry.cached_at.elapsed() < self.ttl);
        let removed = before - cache.len();
        if removed > 0 {
            debug!(removed, remaining = cache.len(), "Purged expired results");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get_stats(&self) -> ResultCacheStats {
        ResultCacheStats {
            size: self.len(),
            ttl_seconds: self.ttl.as_secs_f64(),
        }
    }
}
