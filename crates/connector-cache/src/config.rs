//! Cache configuration options

use std::time::Duration;

/// Configuration for the client cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime of an entry, counted from when it was written
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60), // 30 minutes
        }
    }
}

impl CacheConfig {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Set the TTL duration
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}
