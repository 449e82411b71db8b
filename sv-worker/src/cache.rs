//! Redis-backed page cache. The front-end server reads rendered pages from
//! the same keys this writes.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use sv_worker_core::contract::PageCache;
use sv_worker_core::error::BoxError;

/// Build a `redis://` URL from an address and optional password.
pub fn redis_url(address: &str, auth: Option<&str>) -> String {
    match auth {
        Some(password) => format!("redis://:{password}@{address}"),
        None => format!("redis://{address}"),
    }
}

#[derive(Clone)]
pub struct RedisPageCache {
    conn: ConnectionManager,
}

impl RedisPageCache {
    pub async fn connect(address: &str, auth: Option<&str>) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url(address, auth))?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!(address, "Connected to page cache");
        Ok(Self { conn })
    }
}

#[async_trait]
impl PageCache for RedisPageCache {
    async fn set(&self, key: &str, value: &str) -> Result<(), BoxError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        tracing::debug!(key, bytes = value.len(), "Cached page");
        Ok(())
    }
}
