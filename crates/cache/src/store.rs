//! Backing store trait for variant pools.

use async_trait::async_trait;
use hottake_core::error::CacheError;
use std::time::Duration;

/// A store of capped string lists with per-key expiry.
///
/// Implementations must make [`push_capped`](CacheStore::push_capped)
/// atomic with respect to other callers, so concurrent appends never
/// leave a list longer than `cap`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Backend name for logs (e.g., "redis", "in_memory").
    fn name(&self) -> &str;

    /// Every member of the list at `key`, oldest first. Missing keys are empty.
    async fn members(&self, key: &str) -> Result<Vec<String>, CacheError>;

    /// Append `value`, keep only the newest `cap` members, refresh the
    /// TTL, and return the resulting length.
    async fn push_capped(
        &self,
        key: &str,
        value: String,
        cap: usize,
        ttl: Duration,
    ) -> Result<usize, CacheError>;
}
