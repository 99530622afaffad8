use async_trait::async_trait;
use burrow_core::{CacheEntry, CacheError, LinkCache, Token};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Namespace for this resolver's keys in a shared Redis.
pub const DEFAULT_KEY_PREFIX: &str = "short:";

/// Value stored for a token the store confirmed absent.
///
/// URLs containing control characters are rejected at creation, so this can
/// never collide with a real target.
pub const NEGATIVE_SENTINEL: &str = "\u{0}burrow:absent";

/// A Redis-based implementation of [`LinkCache`].
///
/// Positive entries are stored as the raw URL string and negative entries as
/// [`NEGATIVE_SENTINEL`], both with `SET ... EX`.
#[derive(Debug, Clone)]
pub struct RedisLinkCache {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() || message.to_ascii_lowercase().contains("timed out") {
        CacheError::Timeout(message)
    } else if err.is_connection_dropped() || err.is_connection_refusal() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

/// Redis expiries are whole seconds and must be positive.
fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}

fn encode_entry(entry: CacheEntry) -> String {
    match entry {
        CacheEntry::Url(url) => url,
        CacheEntry::Absent => NEGATIVE_SENTINEL.to_string(),
    }
}

fn decode_entry(value: String) -> CacheEntry {
    if value == NEGATIVE_SENTINEL {
        CacheEntry::Absent
    } else {
        CacheEntry::Url(value)
    }
}

impl RedisLinkCache {
    /// Creates a new Redis link cache using [`DEFAULT_KEY_PREFIX`].
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    /// Creates a new Redis link cache with a custom key prefix.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    /// * `key_prefix` - Prefix isolating these keys from other Redis users (e.g. "myapp:short:")
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Opens a client for `redis_url` and connects with a multiplexed connection.
    pub async fn connect(redis_url: &str, key_prefix: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Initialization(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;
        Ok(Self::with_prefix(conn, key_prefix))
    }

    /// Returns the key prefix.
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Generates the cache key for a token.
    pub fn cache_key(&self, token: &Token) -> String {
        format!("{}{}", self.key_prefix, token.as_str())
    }
}

#[async_trait]
impl LinkCache for RedisLinkCache {
    async fn get(&self, token: &Token) -> Result<Option<CacheEntry>> {
        let key = self.cache_key(token);
        trace!(token = %token, "Fetching entry from Redis cache");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(value)) => {
                let entry = decode_entry(value);
                debug!(token = %token, negative = matches!(entry, CacheEntry::Absent), "Cache hit in Redis");
                Ok(Some(entry))
            }
            Ok(None) => {
                trace!(token = %token, "Cache miss in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(token = %token, error = %e, "Redis error on get");
                Err(map_redis_error("failed to fetch value from Redis", e))
            }
        }
    }

    async fn set(&self, token: &Token, entry: CacheEntry, ttl: Duration) -> Result<()> {
        let key = self.cache_key(token);
        let seconds = ttl_seconds(ttl);
        trace!(token = %token, ttl_secs = seconds, "Storing entry in Redis cache");

        let mut conn = self.conn.clone();
        match conn
            .set_ex::<_, _, ()>(&key, encode_entry(entry), seconds)
            .await
        {
            Ok(()) => {
                debug!(token = %token, "Cached entry in Redis");
                Ok(())
            }
            Err(e) => {
                warn!(token = %token, error = %e, "Failed to cache entry in Redis");
                Err(map_redis_error("failed to write value to Redis", e))
            }
        }
    }
}
