use async_trait::async_trait;
use burrow_core::{CacheEntry, CacheError, LinkCache, Token};
use moka::future::Cache;
use moka::policy::Expiry;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;

const DEFAULT_MAX_CAPACITY: u64 = 100_000;

#[derive(Debug, Clone)]
struct TimedEntry {
    entry: CacheEntry,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, TimedEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &TimedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &TimedEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // an overwrite restarts the clock with the new entry's TTL
        Some(value.ttl)
    }
}

/// An in-memory implementation of [`LinkCache`] using Moka.
///
/// Suitable for single-node deployments and tests. Entries expire after the
/// TTL passed to [`LinkCache::set`]; the capacity bound evicts early under
/// memory pressure.
#[derive(Debug, Clone)]
pub struct MokaLinkCache {
    cache: Cache<String, TimedEntry>,
}

impl MokaLinkCache {
    /// Creates a new Moka link cache holding up to 100,000 entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CAPACITY)
    }

    /// Creates a new Moka link cache with a custom maximum capacity.
    ///
    /// # Arguments
    ///
    /// * `max_capacity` - Maximum number of entries the cache can hold
    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }
}

impl Default for MokaLinkCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkCache for MokaLinkCache {
    async fn get(&self, token: &Token) -> Result<Option<CacheEntry>> {
        trace!(token = %token, "Fetching entry from Moka cache");

        match self.cache.get(token.as_str()).await {
            Some(timed) => {
                debug!(token = %token, negative = matches!(timed.entry, CacheEntry::Absent), "Cache hit in Moka");
                Ok(Some(timed.entry))
            }
            None => {
                trace!(token = %token, "Cache miss in Moka");
                Ok(None)
            }
        }
    }

    async fn set(&self, token: &Token, entry: CacheEntry, ttl: Duration) -> Result<()> {
        trace!(token = %token, ttl_ms = ttl.as_millis() as u64, "Storing entry in Moka cache");

        self.cache
            .insert(token.as_str().to_string(), TimedEntry { entry, ttl })
            .await;
        debug!(token = %token, "Cached entry in Moka");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(id: u64) -> Token {
        Token::from_sequence(id)
    }

    #[tokio::test]
    async fn get_and_set_url() {
        let cache = MokaLinkCache::new();
        let t = token(1);

        assert!(cache.get(&t).await.unwrap().is_none());

        cache
            .set_url(&t, "https://example.com", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            cache.get(&t).await.unwrap(),
            Some(CacheEntry::Url("https://example.com".to_string()))
        );
    }

    #[tokio::test]
    async fn negative_entry_round_trips() {
        let cache = MokaLinkCache::new();
        let t = token(2);

        cache
            .set_negative(&t, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get(&t).await.unwrap(), Some(CacheEntry::Absent));
    }

    #[tokio::test]
    async fn entries_expire_after_their_own_ttl() {
        let cache = MokaLinkCache::new();
        let short = token(3);
        let long = token(4);

        cache
            .set_negative(&short, Duration::from_millis(50))
            .await
            .unwrap();
        cache
            .set_url(&long, "https://example.com", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get(&short).await.unwrap().is_none());
        assert!(cache.get(&long).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn overwrite_uses_new_ttl() {
        let cache = MokaLinkCache::new();
        let t = token(5);

        cache
            .set_negative(&t, Duration::from_millis(50))
            .await
            .unwrap();
        cache
            .set_url(&t, "https://example.com", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(
            cache.get(&t).await.unwrap(),
            Some(CacheEntry::Url("https://example.com".to_string()))
        );
    }

    #[tokio::test]
    async fn handles_many_entries() {
        let cache = MokaLinkCache::with_capacity(1_000);

        for id in 0..50 {
            cache
                .set_url(&token(id), &format!("https://example{id}.com"), Duration::from_secs(60))
                .await
                .unwrap();
        }

        for id in [0, 25, 49] {
            assert_eq!(
                cache.get(&token(id)).await.unwrap(),
                Some(CacheEntry::Url(format!("https://example{id}.com")))
            );
        }
    }
}
