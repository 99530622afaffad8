use burrow_core::{CacheError, StorageError};
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("invalid url: {0}")]
    ValidationFailed(String),
    /// No link exists for the token. Which tier decided is only logged.
    #[error("token not found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(
        #[from]
        #[source]
        StorageError,
    ),
    /// Raised while building the existence filter, never by a lookup.
    #[error("existence filter error: {0}")]
    Filter(
        #[from]
        #[source]
        CacheError,
    ),
}
