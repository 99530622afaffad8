use crate::error::CacheError;
use crate::token::Token;
use async_trait::async_trait;
use std::time::Duration;

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;

/// What a cache holds for a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// The token resolves to this URL.
    Url(String),
    /// The store confirmed the token does not exist.
    Absent,
}

/// A cache-aside layer in front of the [`LinkStore`](crate::LinkStore).
///
/// Entries carry their own TTL so positive and negative results can expire
/// on different schedules. Implementations are free to evict early; callers
/// must treat every miss and every error as "ask the store".
#[async_trait]
pub trait LinkCache: Send + Sync + 'static {
    /// Get the cached entry for `token`.
    ///
    /// Returns `Ok(None)` on a miss.
    async fn get(&self, token: &Token) -> Result<Option<CacheEntry>>;

    /// Store `entry` for `token`, expiring after `ttl`.
    async fn set(&self, token: &Token, entry: CacheEntry, ttl: Duration) -> Result<()>;

    /// Store a positive entry.
    async fn set_url(&self, token: &Token, url: &str, ttl: Duration) -> Result<()> {
        self.set(token, CacheEntry::Url(url.to_string()), ttl).await
    }

    /// Store a negative entry.
    async fn set_negative(&self, token: &Token, ttl: Duration) -> Result<()> {
        self.set(token, CacheEntry::Absent, ttl).await
    }
}
