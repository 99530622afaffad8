//! Core types and ports for the burrow link resolver.
//!
//! This crate holds the token codec, the [`LinkRecord`] model and the two
//! ports the resolution engine is built on: [`LinkStore`] for durable
//! storage and [`LinkCache`] for the cache-aside layer.

pub mod base62;
pub mod cache;
pub mod error;
pub mod record;
pub mod store;
pub mod token;

pub use cache::{CacheEntry, LinkCache};
pub use error::{CacheError, CoreError, StorageError};
pub use record::LinkRecord;
pub use store::LinkStore;
pub use token::{Token, MAX_SEQUENCE, SEQUENCE_OFFSET};
