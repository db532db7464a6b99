//! Per-key variant pools.
//!
//! A pool collects freshly generated takes until it holds `pool_size`
//! entries. From then on lookups return a random member and the agent is
//! skipped. Any store failure degrades to a miss; nothing here surfaces an
//! error to the caller.

use crate::in_memory::InMemoryStore;
use crate::redis_store::RedisStore;
use crate::store::CacheStore;
use hottake_config::{CacheBackend, CacheConfig};
use hottake_core::style::Style;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Deterministic pool key for `(topic, style, agent)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(topic: &str, style: Style, agent: Option<&str>) -> Self {
        let topic = topic.trim().to_lowercase();
        match agent {
            Some(agent) => Self(format!("hot_take:{topic}:{style}:{agent}")),
            None => Self(format!("hot_take:{topic}:{style}")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One stored take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedVariant {
    pub hot_take: String,
    pub agent_used: String,
}

/// Outcome of a pool lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Pool is full; `variant` was drawn uniformly from it.
    Hit { variant: CachedVariant, pool_size: usize },
    /// Pool is short (or the cache is unavailable); generate fresh content.
    Miss { pool_size: usize },
}

impl Lookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit { .. })
    }
}

/// Variant cache over an optional backing store.
#[derive(Clone)]
pub struct VariantCache {
    store: Option<Arc<dyn CacheStore>>,
    pool_size: usize,
    ttl: Duration,
}

impl VariantCache {
    pub fn new(store: Arc<dyn CacheStore>, pool_size: usize, ttl: Duration) -> Self {
        Self {
            store: Some(store),
            pool_size: pool_size.max(1),
            ttl,
        }
    }

    /// A cache that always misses and never stores.
    pub fn disabled() -> Self {
        Self {
            store: None,
            pool_size: 1,
            ttl: Duration::ZERO,
        }
    }

    /// Build from config. Redis needs a URL; a bad URL disables the cache.
    pub fn build_from_config(config: &CacheConfig) -> Self {
        let ttl = Duration::from_secs(config.ttl_secs);
        let op_timeout = Duration::from_millis(config.op_timeout_ms);

        let store: Arc<dyn CacheStore> = match (&config.backend, &config.redis_url) {
            (CacheBackend::None, _) => {
                info!("Variant cache disabled");
                return Self::disabled();
            }
            (CacheBackend::Redis, Some(url)) => match RedisStore::open(url, op_timeout) {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!(error = %e, "Redis cache unavailable, caching disabled");
                    return Self::disabled();
                }
            },
            (CacheBackend::Redis, None) => {
                info!("No redis_url configured, caching disabled");
                return Self::disabled();
            }
            (CacheBackend::Memory, _) => Arc::new(InMemoryStore::new()),
        };

        info!(
            backend = store.name(),
            pool_size = config.variant_pool_size,
            ttl_secs = config.ttl_secs,
            "Variant cache ready"
        );
        Self::new(store, config.variant_pool_size, ttl)
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn backend_name(&self) -> &str {
        self.store.as_ref().map(|s| s.name()).unwrap_or("none")
    }

    /// Look up `key`. Returns a hit only when the pool is full.
    pub async fn lookup(&self, key: &CacheKey) -> Lookup {
        let Some(store) = &self.store else {
            return Lookup::Miss { pool_size: 0 };
        };

        let members = match store.members(key.as_str()).await {
            Ok(members) => members,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return Lookup::Miss { pool_size: 0 };
            }
        };

        let variants: Vec<CachedVariant> = members
            .iter()
            .filter_map(|raw| match serde_json::from_str(raw) {
                Ok(variant) => Some(variant),
                Err(e) => {
                    debug!(key = %key, error = %e, "Skipping unparseable cache entry");
                    None
                }
            })
            .collect();
        let pool_size = variants.len();

        if pool_size < self.pool_size {
            debug!(key = %key, pool_size, cache_hit = false, "Variant pool not full");
            return Lookup::Miss { pool_size };
        }

        match variants.choose(&mut rand::rng()) {
            Some(variant) => {
                info!(key = %key, pool_size, cache_hit = true, "Serving cached variant");
                Lookup::Hit {
                    variant: variant.clone(),
                    pool_size,
                }
            }
            None => Lookup::Miss { pool_size },
        }
    }

    /// Append a variant. Best-effort: returns the new pool size, 0 on failure.
    pub async fn append(&self, key: &CacheKey, variant: &CachedVariant) -> usize {
        let Some(store) = &self.store else {
            return 0;
        };

        let payload = match serde_json::to_string(variant) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "Could not serialize variant");
                return 0;
            }
        };

        match store
            .push_capped(key.as_str(), payload, self.pool_size, self.ttl)
            .await
        {
            Ok(pool_size) => {
                debug!(key = %key, pool_size, "Stored variant");
                pool_size
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache write failed");
                0
            }
        }
    }
}

impl fmt::Debug for VariantCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantCache")
            .field("backend", &self.backend_name())
            .field("pool_size", &self.pool_size)
            .field("ttl", &self.ttl)
            .finish()
    }
}
