//! Cache Statistics Module
//!
//! Tracks page cache outcomes: hits, misses, stored and rejected entries.

use serde::Serialize;

// == Page Cache Stats ==
/// Tracks page cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageCacheStats {
    /// Lookups that found a well-formed entry
    pub hits: u64,
    /// Lookups that found nothing, or a corrupt record
    pub misses: u64,
    /// Entries written to the store
    pub stored: u64,
    /// Entries refused because a hook parameter could not be described
    pub rejected: u64,
}

impl PageCacheStats {
    // == Constructor ==
    /// Creates a new PageCacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_stored(&mut self) {
        self.stored += 1;
    }

    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }
}
