//! In-memory store for single-node deployments and tests.

use crate::store::CacheStore;
use async_trait::async_trait;
use hottake_core::error::CacheError;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

struct Pool {
    members: VecDeque<String>,
    expires_at: Instant,
}

/// Process-local lists with lazy expiry.
pub struct InMemoryStore {
    pools: Arc<RwLock<HashMap<String, Pool>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            pools: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.pools
            .read()
            .await
            .values()
            .filter(|p| p.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn members(&self, key: &str) -> Result<Vec<String>, CacheError> {
        let pools = self.pools.read().await;
        Ok(pools
            .get(key)
            .filter(|pool| pool.expires_at > Instant::now())
            .map(|pool| pool.members.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn push_capped(
        &self,
        key: &str,
        value: String,
        cap: usize,
        ttl: Duration,
    ) -> Result<usize, CacheError> {
        let now = Instant::now();
        let mut pools = self.pools.write().await;
        pools.retain(|_, pool| pool.expires_at > now);

        let pool = pools.entry(key.to_string()).or_insert_with(|| Pool {
            members: VecDeque::new(),
            expires_at: now,
        });
        pool.members.push_back(value);
        while pool.members.len() > cap.max(1) {
            pool.members.pop_front();
        }
        pool.expires_at = now + ttl;
        Ok(pool.members.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn push_returns_length_and_caps() {
        let store = InMemoryStore::new();
        for i in 1..=3 {
            assert_eq!(store.push_capped("k", format!("v{i}"), 5, TTL).await.unwrap(), i);
        }
        for i in 4..=7 {
            store.push_capped("k", format!("v{i}"), 5, TTL).await.unwrap();
        }
        let members = store.members("k").await.unwrap();
        assert_eq!(members, vec!["v3", "v4", "v5", "v6", "v7"]);
    }

    #[tokio::test]
    async fn missing_key_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.members("nope").await.unwrap().is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_and_ttl_refreshes() {
        let store = InMemoryStore::new();
        store.push_capped("k", "a".into(), 5, TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(45)).await;
        store.push_capped("k", "b".into(), 5, TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(45)).await;
        assert_eq!(store.members("k").await.unwrap().len(), 2);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(store.members("k").await.unwrap().is_empty());

        // An expired pool starts over.
        assert_eq!(store.push_capped("k", "c".into(), 5, TTL).await.unwrap(), 1);
    }
}
