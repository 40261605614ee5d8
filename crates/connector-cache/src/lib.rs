//! Write-client cache for the StarRocks connector
//!
//! Writers built from the same connector settings share one client. Clients
//! are created lazily on first use and dropped once they have lived longer
//! than the configured TTL since they were written.
//!
//! # Features
//!
//! - **Single creation**: concurrent callers for one key construct the client once
//! - **Expire after write**: 30 minutes by default, swept lazily or via [`ClientCache::expire_stale`]
//! - **Statistics**: hits, misses, creations and expirations
//!
//! # Example
//!
//! ```ignore
//! use connector_cache::{CacheConfig, ClientCache};
//!
//! let cache: ClientCache<ConnectorConfig, StreamLoadClient> = ClientCache::new(CacheConfig::default());
//! let client = cache.get_or_create(&config, |config| StreamLoadClient::connect(config))?;
//! ```

pub mod cache;
pub mod config;
pub mod stats;

pub use cache::ClientCache;
pub use config::CacheConfig;
pub use stats::CacheStats;
