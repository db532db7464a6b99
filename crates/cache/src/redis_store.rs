//! Redis-backed store: one Redis list per pool.

use crate::store::CacheStore;
use async_trait::async_trait;
use hottake_core::error::CacheError;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use std::future::Future;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;

/// Redis store. The connection is opened lazily on first use and shared.
pub struct RedisStore {
    client: redis::Client,
    connection: OnceCell<MultiplexedConnection>,
    op_timeout: Duration,
}

impl RedisStore {
    /// Create a store from a connection URL. Does not connect yet.
    pub fn open(connection_url: &str, op_timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(connection_url)
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
            op_timeout,
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let conn = self
            .connection
            .get_or_try_init(|| async {
                let conn = self
                    .client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(|e| CacheError::Unavailable(e.to_string()))?;
                info!("Redis cache connected");
                Ok::<_, CacheError>(conn)
            })
            .await?;
        Ok(conn.clone())
    }

    /// Run `op` under the per-operation deadline.
    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        tokio::time::timeout(self.op_timeout, op)
            .await
            .map_err(|_| {
                CacheError::Unavailable(format!(
                    "operation exceeded {}ms",
                    self.op_timeout.as_millis()
                ))
            })?
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    fn name(&self) -> &str {
        "redis"
    }

    async fn members(&self, key: &str) -> Result<Vec<String>, CacheError> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            let members: Vec<String> = conn
                .lrange(key, 0, -1)
                .await
                .map_err(|e| CacheError::Backend(e.to_string()))?;
            Ok(members)
        })
        .await
    }

    async fn push_capped(
        &self,
        key: &str,
        value: String,
        cap: usize,
        ttl: Duration,
    ) -> Result<usize, CacheError> {
        let keep = -(cap.max(1) as isize);
        let ttl_secs = ttl.as_secs().max(1) as i64;

        self.bounded(async {
            let mut conn = self.connection().await?;
            let (len,): (usize,) = redis::pipe()
                .atomic()
                .rpush(key, value)
                .ignore()
                .ltrim(key, keep, -1)
                .ignore()
                .expire(key, ttl_secs)
                .ignore()
                .llen(key)
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheError::Backend(e.to_string()))?;
            Ok(len)
        })
        .await
    }
}
