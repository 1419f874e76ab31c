//! Durable storage for the bootstrap token.

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Durable key/value store
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the stored value, or `None` if the key is absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, overwriting any previous value
    async fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// Redis-backed store
#[derive(Clone)]
pub struct RedisStore {
    /// Redis connection manager (auto-reconnecting)
    redis: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;

        let redis = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        Ok(Self { redis })
    }
}

#[async_trait]
impl CredentialStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.redis.clone();
        let value: Option<String> = conn
            .get(key)
            .await
            .with_context(|| format!("Failed to read key {:?} from Redis", key))?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        let _: () = conn
            .set(key, value)
            .await
            .with_context(|| format!("Failed to write key {:?} to Redis", key))?;
        Ok(())
    }
}
