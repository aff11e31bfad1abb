//! Redis-backed session store.
//!
//! Entries are written with `SET key value PX <ttl-ms>`, so expiry is
//! enforced by Redis itself.

use crate::{SessionStore, StoreError, StoreResult};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, RedisResult};
use std::time::Duration;
use tracing::{debug, info};

/// Redis [`SessionStore`] over a multiplexed async connection.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
}

impl RedisSessionStore {
    /// Connect to Redis at `redis_url` (e.g. `redis://127.0.0.1:6379/0`).
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;

        info!("connected to redis session store");
        Ok(Self { conn })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> StoreResult<()> {
        let ttl_ms = u64::try_from(ttl.as_millis())
            .map_err(|_| StoreError::Write(format!("ttl out of range: {ttl:?}")))?;

        // Redis rejects PX 0; a zero TTL means the entry must read back absent.
        if ttl_ms == 0 {
            return self.delete(key).await;
        }

        let result: RedisResult<()> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut self.conn.clone())
            .await;
        result.map_err(|e| StoreError::Write(e.to_string()))?;

        debug!(ttl_ms, "wrote session entry");
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut self.conn.clone())
            .await?;

        value.ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let result: RedisResult<i64> = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut self.conn.clone())
            .await;
        let removed = result.map_err(|e| StoreError::Write(e.to_string()))?;

        debug!(removed, "deleted session entry");
        Ok(())
    }
}
