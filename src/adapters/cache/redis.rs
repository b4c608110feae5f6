//! Redis-backed cache implementation for production deployments.
//!
//! Stores serialized values with a TTL. Suitable for multi-server
//! deployments where a local map would go stale.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::CacheStore;

/// Redis-backed cache store.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisCacheStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            key_prefix: "billing".to_string(),
        }
    }

    /// Override the key prefix, e.g. to isolate test runs.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }
}

fn cache_error(e: redis::RedisError) -> DomainError {
    DomainError::new(ErrorCode::CacheError, format!("Redis operation failed: {}", e))
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.conn.clone();
        conn.get(self.prefixed(key)).await.map_err(cache_error)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(self.prefixed(key), value, ttl.as_secs())
            .await
            .map_err(cache_error)
    }

    async fn remove(&self, key: &str) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.prefixed(key))
            .await
            .map_err(cache_error)
    }
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}
