//! Bloom filter over every token the store has ever allocated.
//!
//! The filter answers "definitely never allocated" or "might be allocated".
//! It has no false negatives once warmed, so a negative answer lets the
//! resolver reject a lookup without touching the cache or the store. A false
//! positive only costs one extra round trip further down.
//!
//! Entries are never removed: links are immutable and live forever in the
//! store, so the filter only grows for the lifetime of the process.

use bloomfilter::Bloom;
use burrow_core::{CacheError, LinkStore, StorageError, Token};
use parking_lot::RwLock;
use tracing::{debug, info};
use typed_builder::TypedBuilder;

pub const DEFAULT_EXPECTED_ITEMS: usize = 1_000_000;
pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.01;

/// Sizing for the [`ExistenceFilter`].
#[derive(Debug, Clone, Copy, PartialEq, TypedBuilder)]
pub struct ExistenceFilterConfig {
    /// Expected number of tokens the filter will hold.
    ///
    /// Going past this raises the false positive rate above the target.
    #[builder(default = DEFAULT_EXPECTED_ITEMS)]
    pub expected_items: usize,

    /// Target false positive rate, strictly between 0.0 and 1.0.
    #[builder(default = DEFAULT_FALSE_POSITIVE_RATE)]
    pub false_positive_rate: f64,
}

impl Default for ExistenceFilterConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concurrent Bloom filter keyed by [`Token`].
///
/// Many `might_contain` calls may run at once; `add` and warm-up batches take
/// the lock exclusively. The lock is never held across an `.await`.
pub struct ExistenceFilter {
    bloom: RwLock<Bloom<str>>,
}

impl ExistenceFilter {
    /// Creates an empty filter sized by `config`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Initialization` if `expected_items` is zero or the
    /// false positive rate is outside `(0.0, 1.0)`.
    pub fn new(config: ExistenceFilterConfig) -> Result<Self, CacheError> {
        if config.expected_items == 0 {
            return Err(CacheError::Initialization(
                "expected_items must be greater than zero".to_string(),
            ));
        }
        if !(config.false_positive_rate > 0.0 && config.false_positive_rate < 1.0) {
            return Err(CacheError::Initialization(format!(
                "false_positive_rate must be in (0, 1), got {}",
                config.false_positive_rate
            )));
        }

        let bloom = Bloom::new_for_fp_rate(config.expected_items, config.false_positive_rate)
            .map_err(|e| CacheError::Initialization(e.to_string()))?;

        debug!(
            expected_items = config.expected_items,
            false_positive_rate = config.false_positive_rate,
            "created existence filter"
        );

        Ok(Self {
            bloom: RwLock::new(bloom),
        })
    }

    /// Records `token` as allocated. Idempotent.
    pub fn add(&self, token: &Token) {
        self.bloom.write().set(token.as_str());
    }

    /// Returns `false` only if `token` was never added.
    pub fn might_contain(&self, token: &Token) -> bool {
        self.bloom.read().check(token.as_str())
    }

    /// Loads every token in `store` into the filter, `batch_size` at a time.
    ///
    /// Only one page of tokens is held in memory at once, and the write lock
    /// is taken once per page. Returns the number of tokens loaded.
    ///
    /// This must finish before the resolver starts serving: a token created
    /// in another process and not yet loaded would be reported as absent.
    pub async fn warm<S: LinkStore>(
        &self,
        store: &S,
        batch_size: u64,
    ) -> Result<usize, StorageError> {
        let batch_size = batch_size.max(1);
        let mut offset = 0_u64;
        let mut loaded = 0_usize;

        info!(batch_size, "warming existence filter");

        loop {
            let tokens = store.list_tokens(offset, batch_size).await?;
            if tokens.is_empty() {
                break;
            }

            {
                let mut bloom = self.bloom.write();
                for token in &tokens {
                    bloom.set(token.as_str());
                }
            }

            let page_len = tokens.len();
            loaded += page_len;
            offset += page_len as u64;
            debug!(loaded, "loaded token page into existence filter");

            if (page_len as u64) < batch_size {
                break;
            }
        }

        info!(loaded, "existence filter warm-up complete");
        Ok(loaded)
    }
}

impl std::fmt::Debug for ExistenceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bloom = self.bloom.read();
        f.debug_struct("ExistenceFilter")
            .field("bits", &bloom.len())
            .field("hash_functions", &bloom.number_of_hash_functions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use burrow_core::LinkRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Serves a fixed token list through the pagination contract.
    struct PagedTokens {
        tokens: Vec<Token>,
        pages_served: AtomicUsize,
    }

    impl PagedTokens {
        fn with_sequences(count: u64) -> Self {
            Self {
                tokens: (1..=count).map(Token::from_sequence).collect(),
                pages_served: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LinkStore for PagedTokens {
        async fn create_then_assign_token<F>(
            &self,
            _url: &str,
            _assign: F,
        ) -> Result<LinkRecord, StorageError>
        where
            F: FnOnce(u64) -> Token + Send,
        {
            Err(StorageError::Operation("read-only".to_string()))
        }

        async fn find_by_token(&self, _token: &Token) -> Result<Option<LinkRecord>, StorageError> {
            Ok(None)
        }

        async fn list_tokens(&self, offset: u64, limit: u64) -> Result<Vec<Token>, StorageError> {
            self.pages_served.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .tokens
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl LinkStore for BrokenStore {
        async fn create_then_assign_token<F>(
            &self,
            _url: &str,
            _assign: F,
        ) -> Result<LinkRecord, StorageError>
        where
            F: FnOnce(u64) -> Token + Send,
        {
            Err(StorageError::Unavailable("down".to_string()))
        }

        async fn find_by_token(&self, _token: &Token) -> Result<Option<LinkRecord>, StorageError> {
            Err(StorageError::Unavailable("down".to_string()))
        }

        async fn list_tokens(&self, _offset: u64, _limit: u64) -> Result<Vec<Token>, StorageError> {
            Err(StorageError::Unavailable("down".to_string()))
        }
    }

    fn small_filter() -> ExistenceFilter {
        ExistenceFilter::new(
            ExistenceFilterConfig::builder()
                .expected_items(10_000)
                .false_positive_rate(0.001)
                .build(),
        )
        .unwrap()
    }

    #[test]
    fn default_config_matches_documented_sizing() {
        let config = ExistenceFilterConfig::default();
        assert_eq!(config.expected_items, 1_000_000);
        assert_eq!(config.false_positive_rate, 0.01);
    }

    #[test]
    fn rejects_invalid_config() {
        let zero_items = ExistenceFilterConfig::builder().expected_items(0).build();
        assert!(matches!(
            ExistenceFilter::new(zero_items),
            Err(CacheError::Initialization(_))
        ));

        for rate in [0.0, 1.0, -0.5, f64::NAN] {
            let config = ExistenceFilterConfig::builder()
                .false_positive_rate(rate)
                .build();
            assert!(
                matches!(ExistenceFilter::new(config), Err(CacheError::Initialization(_))),
                "rate {rate} should be rejected"
            );
        }
    }

    #[test]
    fn debug_reports_sizing_without_contents() {
        let filter = small_filter();
        filter.add(&Token::from_sequence(1));

        let rendered = format!("{filter:?}");

        assert!(rendered.starts_with("ExistenceFilter"));
        assert!(rendered.contains("bits"));
        assert!(rendered.contains("hash_functions"));
        assert!(!rendered.contains(Token::from_sequence(1).as_str()));
    }

    #[test]
    fn empty_filter_contains_nothing() {
        let filter = small_filter();
        assert!(!filter.might_contain(&Token::from_sequence(1)));
    }

    #[test]
    fn add_then_might_contain() {
        let filter = small_filter();
        let token = Token::from_sequence(42);

        filter.add(&token);
        filter.add(&token);

        assert!(filter.might_contain(&token));
    }

    #[test]
    fn false_positive_rate_within_bounds() {
        let filter = small_filter();
        for id in 0..10_000 {
            filter.add(&Token::from_sequence(id));
        }

        let false_positives = (1_000_000..1_010_000)
            .filter(|id| filter.might_contain(&Token::from_sequence(*id)))
            .count();

        // target is 0.1%, i.e. about 10 of 10_000
        assert!(
            false_positives < 50,
            "false positive rate too high: {false_positives}/10000"
        );
    }

    #[tokio::test]
    async fn warm_loads_every_page() {
        let filter = small_filter();
        let store = PagedTokens::with_sequences(2_500);

        let loaded = filter.warm(&store, 1_000).await.unwrap();

        assert_eq!(loaded, 2_500);
        // two full pages, then a short one ends the scan
        assert_eq!(store.pages_served.load(Ordering::SeqCst), 3);
        for token in &store.tokens {
            assert!(filter.might_contain(token), "{token} missing after warm");
        }
    }

    #[tokio::test]
    async fn warm_stops_on_empty_page() {
        let filter = small_filter();
        let store = PagedTokens::with_sequences(2_000);

        let loaded = filter.warm(&store, 1_000).await.unwrap();

        assert_eq!(loaded, 2_000);
        assert_eq!(store.pages_served.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn warm_on_empty_store_loads_nothing() {
        let filter = small_filter();
        let store = PagedTokens::with_sequences(0);

        assert_eq!(filter.warm(&store, 100).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn warm_propagates_store_errors() {
        let filter = small_filter();

        let err = filter.warm(&BrokenStore, 100).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_add_and_check() {
        let filter = Arc::new(small_filter());
        let mut handles = vec![];

        for id in 0..200 {
            let filter = Arc::clone(&filter);
            handles.push(tokio::spawn(async move {
                let token = Token::from_sequence(id);
                filter.add(&token);
                assert!(filter.might_contain(&token));
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        for id in 0..200 {
            assert!(filter.might_contain(&Token::from_sequence(id)));
        }
    }
}
