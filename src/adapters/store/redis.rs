//! Redis-backed key-value store for deployments that share state.
//!
//! Records are plain `GET`/`SET` values under an optional key prefix.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::ports::{KeyValueStore, StoreError};

/// Redis-backed key-value store.
pub struct RedisKeyValueStore {
    conn: MultiplexedConnection,
    key_prefix: String,
    closed: AtomicBool,
}

impl RedisKeyValueStore {
    /// Create a store over an existing connection.
    pub fn new(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
            closed: AtomicBool::new(false),
        }
    }

    /// Connect to `url` and create a store.
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)
            .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))?;

        Ok(Self::new(conn, key_prefix))
    }

    fn redis_key(&self, key: &str) -> String {
        prefixed_key(&self.key_prefix, key)
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

fn prefixed_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}:{}", prefix, key)
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.ensure_open()?;
        let mut conn = self.conn.clone();

        conn.get(self.redis_key(key))
            .await
            .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.ensure_open()?;
        let mut conn = self.conn.clone();

        conn.set::<_, _, ()>(self.redis_key(key), value)
            .await
            .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }

    async fn close(&self) -> Result<(), StoreError> {
        // The multiplexed connection closes when the last clone drops.
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl std::fmt::Debug for RedisKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKeyValueStore")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}
