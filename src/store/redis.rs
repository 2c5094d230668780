//! RESP counter store.
//!
//! Serves both production backends: the primary store speaks the protocol
//! natively, and the secondary (SSDB) store exposes a compatible listener,
//! so the two families differ only in the endpoint they are pointed at.

use std::collections::BTreeMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::error::Result;

use super::CounterStore;

/// Counter store over a managed RESP connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect and start the reconnecting connection manager.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn increment(&self, key: &str, field: &str, amount: u64) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: u64 = conn.hincr(key, field, amount).await?;
        Ok(())
    }

    async fn read_field(&self, key: &str, field: &str) -> Result<Option<u64>> {
        let mut conn = self.conn.clone();
        Ok(conn.hget(key, field).await?)
    }

    async fn read_counter(&self, key: &str) -> Result<BTreeMap<String, u64>> {
        let mut conn = self.conn.clone();
        Ok(conn.hgetall(key).await?)
    }

    async fn delete_field(&self, key: &str, field: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.hdel(key, field).await?;
        Ok(removed > 0)
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut keys = Vec::new();
        let mut iter = conn.scan_match::<_, String>(pattern).await?;
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        Ok(keys)
    }

    async fn read_string(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }
}
