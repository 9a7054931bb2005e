//! Kernel row cache
//!
//! Provides an LRU cache of Q-matrix rows for the SMO solver. Each entry is a
//! complete row shared through an `Arc`, so the solver can hold the rows of
//! both working-set variables while the cache keeps evicting.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// LRU cache of kernel rows keyed by row index
pub struct KernelCache {
    cache: LruCache<usize, Arc<[f64]>>,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Create a new kernel cache holding at most `capacity` rows
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Create a kernel cache sized from a memory budget in bytes
    ///
    /// At least two rows are always kept, since one solver step needs two.
    pub fn with_memory_limit(memory_bytes: usize, row_len: usize) -> Self {
        let row_bytes = (row_len * std::mem::size_of::<f64>()).max(1);
        Self::new((memory_bytes / row_bytes).max(2))
    }

    /// Get row `i`, computing it with `compute` on a miss
    pub fn get_or_insert_with<F>(&mut self, i: usize, compute: F) -> Arc<[f64]>
    where
        F: FnOnce() -> Vec<f64>,
    {
        if let Some(row) = self.cache.get(&i) {
            self.hits += 1;
            return Arc::clone(row);
        }
        self.misses += 1;
        let row: Arc<[f64]> = compute().into();
        self.cache.put(i, Arc::clone(&row));
        row
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.cache.cap().get(),
            size: self.cache.len(),
        }
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.cache.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}
