use crate::error::StorageError;
use crate::record::LinkRecord;
use crate::token::{Token, MAX_SEQUENCE};
use async_trait::async_trait;

/// Type alias for storage results.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Rejects store-assigned ids that have no distinct token.
///
/// Adapters call this before handing the id to the assign function, so an
/// exhausted id space fails the transaction instead of reusing a token.
pub fn check_sequence(sequence_id: u64) -> Result<()> {
    if sequence_id > MAX_SEQUENCE {
        return Err(StorageError::InvalidData(format!(
            "sequence id {sequence_id} is above the largest encodable id {MAX_SEQUENCE}"
        )));
    }
    Ok(())
}

/// Durable, transactional storage for [`LinkRecord`]s.
///
/// This is the only source of truth for links. The engine depends on this
/// port alone, so a relational adapter and an in-memory fake are
/// interchangeable.
#[async_trait]
pub trait LinkStore: Send + Sync + 'static {
    /// Allocates a new link for `url` in a single transaction.
    ///
    /// The store inserts a row without a token and assigns the sequence id,
    /// `assign` derives the token from that id, and the row is updated with
    /// it. Either both writes commit or neither does.
    async fn create_then_assign_token<F>(&self, url: &str, assign: F) -> Result<LinkRecord>
    where
        F: FnOnce(u64) -> Token + Send;

    /// Looks up the record for `token`.
    ///
    /// Returns `Ok(None)` if no such link was ever allocated.
    async fn find_by_token(&self, token: &Token) -> Result<Option<LinkRecord>>;

    /// Lists allocated tokens in sequence order, skipping the first `offset`
    /// and returning at most `limit`.
    ///
    /// An empty page means the end of the token set.
    async fn list_tokens(&self, offset: u64, limit: u64) -> Result<Vec<Token>>;
}
