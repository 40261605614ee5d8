//! Cache statistics tracking

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for client cache activity
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Lookups served by a live entry
    hits: AtomicU64,
    /// Lookups that found no entry
    misses: AtomicU64,
    /// Clients built by a factory
    creations: AtomicU64,
    /// Entries dropped because their TTL elapsed
    expirations: AtomicU64,
    /// Entries removed explicitly
    invalidations: AtomicU64,
    /// Current number of entries
    entry_count: AtomicU64,
}

impl CacheStats {
    /// Create zeroed statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a lookup served from the cache
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup with no entry
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a client built by a factory
    pub fn record_creation(&self) {
        self.creations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` entries dropped by TTL
    pub fn record_expirations(&self, count: u64) {
        self.expirations.fetch_add(count, Ordering::Relaxed);
    }

    /// Record an explicit removal
    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Update entry count
    pub fn set_entry_count(&self, count: u64) {
        self.entry_count.store(count, Ordering::Relaxed);
    }

    /// Get hit count
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Get miss count
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Get creation count
    pub fn creations(&self) -> u64 {
        self.creations.load(Ordering::Relaxed)
    }

    /// Get expiration count
    pub fn expirations(&self) -> u64 {
        self.expirations.load(Ordering::Relaxed)
    }

    /// Get invalidation count
    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }

    /// Get current entry count
    pub fn entry_count(&self) -> u64 {
        self.entry_count.load(Ordering::Relaxed)
    }

    /// Calculate hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    /// Get total lookups (hits + misses)
    pub fn total_requests(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Reset the activity counters; the entry count is left alone.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.creations.store(0, Ordering::Relaxed);
        self.expirations.store(0, Ordering::Relaxed);
        self.invalidations.store(0, Ordering::Relaxed);
    }
}

impl Clone for CacheStats {
    fn clone(&self) -> Self {
        Self {
            hits: AtomicU64::new(self.hits()),
            misses: AtomicU64::new(self.misses()),
            creations: AtomicU64::new(self.creations()),
            expirations: AtomicU64::new(self.expirations()),
            invalidations: AtomicU64::new(self.invalidations()),
            entry_count: AtomicU64::new(self.entry_count()),
        }
    }
}
