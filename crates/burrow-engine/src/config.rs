use burrow_cache::ExistenceFilterConfig;
use std::time::Duration;
use typed_builder::TypedBuilder;

pub const DEFAULT_POSITIVE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_NEGATIVE_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_WARM_BATCH_SIZE: u64 = 1_000;

/// Tunables for a [`ResolutionEngine`](crate::ResolutionEngine).
///
/// Cache key namespacing belongs to the cache adapter, see
/// `RedisLinkCache::with_prefix`.
#[derive(Debug, Clone, PartialEq, TypedBuilder)]
pub struct EngineConfig {
    /// How long a resolved URL stays cached.
    #[builder(default = DEFAULT_POSITIVE_TTL)]
    pub positive_ttl: Duration,

    /// How long a confirmed-absent token stays cached.
    ///
    /// Kept short so a token allocated by another node shortly after a miss
    /// is not masked for long.
    #[builder(default = DEFAULT_NEGATIVE_TTL)]
    pub negative_ttl: Duration,

    /// Page size used when warming the existence filter.
    #[builder(default = DEFAULT_WARM_BATCH_SIZE)]
    pub warm_batch_size: u64,

    #[builder(default)]
    pub filter: ExistenceFilterConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
