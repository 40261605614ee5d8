//! Keyed client cache with expire-after-write eviction

use crate::config::CacheConfig;
use crate::stats::CacheStats;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Entry stored in the cache
struct CacheEntry<C> {
    client: Arc<C>,
    /// When the client was written
    created_at: Instant,
}

impl<C> CacheEntry<C> {
    fn new(client: C) -> Self {
        Self {
            client: Arc::new(client),
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// Thread-safe map from key to a lazily built client.
///
/// Lookups for one key are serialized on its shard, so a factory runs at
/// most once per key even under contention. A factory must not call back
/// into the same cache.
pub struct ClientCache<K, C> {
    entries: DashMap<K, CacheEntry<C>>,
    config: CacheConfig,
    stats: Arc<CacheStats>,
}

impl<K, C> ClientCache<K, C>
where
    K: Hash + Eq + Clone,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Create a cache with default configuration
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Return the live client for `key`, building it with `create` when the
    /// key is absent or its entry has expired.
    ///
    /// A failed factory leaves no entry behind.
    pub fn get_or_create<F, E>(&self, key: &K, create: F) -> Result<Arc<C>, E>
    where
        F: FnOnce(&K) -> Result<C, E>,
    {
        let ttl = self.config.ttl;
        let result = match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().is_expired(ttl) {
                    self.stats.record_hit();
                    return Ok(Arc::clone(&occupied.get().client));
                }
                tracing::debug!("Cached client expired after {:?}, rebuilding.", ttl);
                self.stats.record_expirations(1);
                self.stats.record_miss();
                match create(key) {
                    Ok(client) => {
                        self.stats.record_creation();
                        let entry = CacheEntry::new(client);
                        let client = Arc::clone(&entry.client);
                        occupied.insert(entry);
                        Ok(client)
                    }
                    Err(e) => {
                        occupied.remove();
                        Err(e)
                    }
                }
            }
            Entry::Vacant(vacant) => {
                self.stats.record_miss();
                create(key).map(|client| {
                    self.stats.record_creation();
                    tracing::debug!("Created new cached client.");
                    let entry = CacheEntry::new(client);
                    let client = Arc::clone(&entry.client);
                    vacant.insert(entry);
                    client
                })
            }
        };
        self.stats.set_entry_count(self.entries.len() as u64);
        result
    }

    /// Return the client for `key` if it is present and live.
    pub fn get(&self, key: &K) -> Option<Arc<C>> {
        let ttl = self.config.ttl;
        let live = self
            .entries
            .get(key)
            .map(|entry| (!entry.is_expired(ttl)).then(|| Arc::clone(&entry.client)));

        match live {
            Some(Some(client)) => {
                self.stats.record_hit();
                Some(client)
            }
            Some(None) => {
                if self
                    .entries
                    .remove_if(key, |_, entry| entry.is_expired(ttl))
                    .is_some()
                {
                    self.stats.record_expirations(1);
                }
                self.stats.record_miss();
                self.stats.set_entry_count(self.entries.len() as u64);
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Drop the entry for `key`; returns whether one was present.
    pub fn invalidate(&self, key: &K) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.stats.record_invalidation();
            self.stats.set_entry_count(self.entries.len() as u64);
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
        self.stats.set_entry_count(0);
    }

    /// Remove all expired entries, returning how many were dropped.
    pub fn expire_stale(&self) -> usize {
        let ttl = self.config.ttl;
        let mut expired = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(ttl);
            if !keep {
                expired += 1;
            }
            keep
        });
        if expired > 0 {
            tracing::debug!("Expired {} cached clients.", expired);
            self.stats.record_expirations(expired as u64);
        }
        self.stats.set_entry_count(self.entries.len() as u64);
        expired
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Shared handle to the statistics
    pub fn stats_arc(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }
}

impl<K, C> fmt::Debug for ClientCache<K, C>
where
    K: Hash + Eq,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCache")
            .field("entries", &self.entries.len())
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish()
    }
}
