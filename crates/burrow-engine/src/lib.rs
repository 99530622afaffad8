//! Tiered token resolution.
//!
//! [`ResolutionEngine`] allocates tokens through a [`LinkStore`] and resolves
//! them through three tiers, cheapest first: the in-process
//! [`ExistenceFilter`], a [`LinkCache`] and finally the store.
//!
//! ```rust
//! use burrow_cache::MokaLinkCache;
//! use burrow_engine::{EngineConfig, ResolutionEngine};
//! use burrow_storage::InMemoryStore;
//!
//! # async fn example() -> Result<(), burrow_engine::EngineError> {
//! let engine = ResolutionEngine::new(
//!     InMemoryStore::new(),
//!     MokaLinkCache::new(),
//!     EngineConfig::default(),
//! )?;
//! engine.warm().await?;
//!
//! let token = engine.create("https://example.com").await?;
//! assert_eq!(engine.resolve(token.as_str()).await?, "https://example.com");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;

pub use burrow_cache::{ExistenceFilter, ExistenceFilterConfig};
pub use burrow_core::{LinkCache, LinkStore, Token};
pub use config::EngineConfig;
pub use engine::ResolutionEngine;
pub use error::{EngineError, Result};
