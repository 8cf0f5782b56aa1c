//! Redis cache store.
//!
//! One [`ConnectionManager`] is established at startup and cloned per command;
//! clones share the same multiplexed connection and reconnect on their own.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::{debug, info, instrument};

use stratus_core::error::{Result, StratusError};
use stratus_core::traits::CacheStore;

/// Redis-backed cache store.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
    url: String,
}

impl RedisCacheStore {
    /// Opens a connection to `url` (e.g. `redis://localhost:6379`) and pings it.
    ///
    /// # Errors
    /// - [`StratusError::ConfigError`] if the URL cannot be parsed
    /// - [`StratusError::CacheUnavailable`] if the server cannot be reached
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| StratusError::ConfigError(format!("Invalid Redis URL: {}", e)))?;

        // The manager retries its first connect with backoff; probe once so an
        // unreachable server fails startup immediately.
        let mut probe = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StratusError::CacheUnavailable(e.to_string()))?;
        let _pong: String = redis::cmd("PING")
            .query_async(&mut probe)
            .await
            .map_err(|e| StratusError::CacheUnavailable(e.to_string()))?;

        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| StratusError::CacheUnavailable(e.to_string()))?;

        let store = Self {
            conn,
            url: redact_url(url),
        };

        info!(url = %store.url, "Connected to Redis");
        Ok(store)
    }

    /// Connection URL with any password removed.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| StratusError::cache_op("GET", e))?;
        debug!(hit = value.is_some(), "Redis GET");
        Ok(value)
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(|e| StratusError::cache_op("SETEX", e))
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| StratusError::CacheUnavailable(e.to_string()))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("url", &self.url)
            .finish()
    }
}

/// Strips credentials from a Redis URL for logging.
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
