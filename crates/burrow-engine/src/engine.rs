use std::sync::Arc;

use burrow_cache::ExistenceFilter;
use burrow_core::{CacheEntry, LinkCache, LinkStore, Token};
use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// Allocates tokens and resolves them through the filter, cache and store.
///
/// The store is the only source of truth. The filter and the cache hold
/// projections of it that may be stale or evicted, and a failure in the
/// cache never changes the answer, only the latency.
///
/// Cloning is cheap: all components are shared behind `Arc`s.
pub struct ResolutionEngine<S, C> {
    store: Arc<S>,
    cache: Arc<C>,
    filter: Arc<ExistenceFilter>,
    config: Arc<EngineConfig>,
}

impl<S, C> Clone for ResolutionEngine<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            filter: Arc::clone(&self.filter),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, C> std::fmt::Debug for ResolutionEngine<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionEngine")
            .field("filter", &self.filter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(EngineError::ValidationFailed(
            "url must not be empty".to_string(),
        ));
    }
    if url.chars().any(char::is_control) {
        return Err(EngineError::ValidationFailed(
            "url must not contain control characters".to_string(),
        ));
    }
    Ok(())
}

impl<S: LinkStore, C: LinkCache> ResolutionEngine<S, C> {
    /// Creates an engine with an empty existence filter sized by
    /// `config.filter`.
    ///
    /// Call [`warm`](Self::warm) before serving lookups against a store
    /// that already holds links.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Filter`] if the filter sizing is invalid.
    pub fn new(store: S, cache: C, config: EngineConfig) -> Result<Self> {
        let filter = ExistenceFilter::new(config.filter)?;
        Ok(Self::with_filter(store, cache, Arc::new(filter), config))
    }

    /// Creates an engine around an existing filter.
    ///
    /// `config.filter` is ignored; the filter is used as given.
    pub fn with_filter(
        store: S,
        cache: C,
        filter: Arc<ExistenceFilter>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store: Arc::new(store),
            cache: Arc::new(cache),
            filter,
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn filter(&self) -> &ExistenceFilter {
        &self.filter
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loads every token already in the store into the existence filter.
    ///
    /// Returns the number of tokens loaded.
    pub async fn warm(&self) -> Result<usize> {
        let loaded = self
            .filter
            .warm(self.store.as_ref(), self.config.warm_batch_size)
            .await?;
        Ok(loaded)
    }

    /// Allocates a token for `url`.
    ///
    /// The record is committed to the store before the filter and cache
    /// learn about it, so a concurrent `resolve` can at worst miss the cache
    /// and read the committed row.
    ///
    /// # Errors
    ///
    /// * [`EngineError::ValidationFailed`] if `url` is empty or contains
    ///   control characters. Nothing is written.
    /// * [`EngineError::Storage`] if the store transaction fails.
    pub async fn create(&self, url: &str) -> Result<Token> {
        validate_url(url)?;
        trace!(url = %url, "creating link");

        let record = self
            .store
            .create_then_assign_token(url, Token::from_sequence)
            .await?;
        let token = record.token;

        self.filter.add(&token);
        if let Err(e) = self
            .cache
            .set_url(&token, url, self.config.positive_ttl)
            .await
        {
            warn!(token = %token, error = %e, "failed to prime cache after create");
        }

        debug!(token = %token, sequence_id = record.sequence_id, "created link");
        Ok(token)
    }

    /// Resolves `raw` to its target URL.
    ///
    /// # Errors
    ///
    /// * [`EngineError::NotFound`] if no link exists for the token.
    /// * [`EngineError::Storage`] if the store had to be asked and failed.
    pub async fn resolve(&self, raw: &str) -> Result<String> {
        let token = match Token::parse(raw) {
            Ok(token) => token,
            Err(e) => {
                debug!(token = %raw, error = %e, "malformed token, not found");
                return Err(EngineError::NotFound);
            }
        };
        trace!(token = %token, "resolving token");

        if !self.filter.might_contain(&token) {
            debug!(token = %token, "blocked by existence filter");
            return Err(EngineError::NotFound);
        }

        match self.cache.get(&token).await {
            Ok(Some(CacheEntry::Url(url))) => {
                debug!(token = %token, "resolved from cache");
                return Ok(url);
            }
            Ok(Some(CacheEntry::Absent)) => {
                debug!(token = %token, "intercepted by negative cache entry");
                return Err(EngineError::NotFound);
            }
            Ok(None) => {
                trace!(token = %token, "cache miss, querying store");
            }
            Err(e) => {
                warn!(token = %token, error = %e, "cache error, falling back to store");
            }
        }

        match self.store.find_by_token(&token).await? {
            Some(record) => {
                if let Err(e) = self
                    .cache
                    .set_url(&token, &record.target_url, self.config.positive_ttl)
                    .await
                {
                    warn!(token = %token, error = %e, "failed to backfill cache");
                }
                debug!(token = %token, "resolved from store");
                Ok(record.target_url)
            }
            None => {
                if let Err(e) = self
                    .cache
                    .set_negative(&token, self.config.negative_ttl)
                    .await
                {
                    warn!(token = %token, error = %e, "failed to cache negative entry");
                }
                debug!(token = %token, "absent from store, cached negative entry");
                Err(EngineError::NotFound)
            }
        }
    }
}
