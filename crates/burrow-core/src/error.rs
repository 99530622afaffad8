use thiserror::Error;

/// Errors related to the core types of the link resolver.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache initialization failed: {0}")]
    Initialization(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl From<CoreError> for StorageError {
    fn from(value: CoreError) -> Self {
        StorageError::InvalidData(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_errors_name_the_failure() {
        let cases = [
            (CacheError::Unavailable("refused".into()), "unavailable"),
            (CacheError::Timeout("slow".into()), "timed out"),
            (CacheError::Initialization("bad size".into()), "initialization"),
            (CacheError::Operation("WRONGTYPE".into()), "failed"),
        ];

        for (err, expected) in cases {
            let kind = match &err {
                CacheError::Unavailable(_)
                | CacheError::Timeout(_)
                | CacheError::Initialization(_)
                | CacheError::Operation(_) => err.to_string(),
            };
            assert!(kind.contains(expected), "{kind}");
        }
    }

    #[test]
    fn core_errors_convert_to_invalid_data() {
        let err: StorageError = CoreError::InvalidToken("a-b".to_string()).into();
        assert!(matches!(err, StorageError::InvalidData(ref msg) if msg.contains("a-b")));
    }
}
