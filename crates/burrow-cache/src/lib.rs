//! Existence filter and cache adapters for the burrow resolver.
//!
//! - [`ExistenceFilter`]: a lock-guarded Bloom filter over every allocated
//!   token, warmed from the store at boot.
//! - [`RedisLinkCache`]: the shared cache tier, storing URLs and a reserved
//!   negative sentinel with per-key TTLs.
//! - [`MokaLinkCache`]: an in-process cache with the same contract.

pub mod existence_filter;
pub mod moka;
pub mod redis;

pub use burrow_core::cache::{CacheEntry, LinkCache, Result};
pub use existence_filter::{
    ExistenceFilter, ExistenceFilterConfig, DEFAULT_EXPECTED_ITEMS, DEFAULT_FALSE_POSITIVE_RATE,
};
pub use self::moka::MokaLinkCache;
pub use self::redis::{RedisLinkCache, DEFAULT_KEY_PREFIX, NEGATIVE_SENTINEL};
