use async_trait::async_trait;
use burrow_core::store::{check_sequence, Result};
use burrow_core::{LinkRecord, LinkStore, StorageError, Token};
use dashmap::DashMap;
use jiff::Timestamp;
use parking_lot::RwLock;
use tracing::debug;

/// In-memory [`LinkStore`].
///
/// Records live in a `DashMap` keyed by token, so lookups never contend with
/// each other. Allocation takes a single lock over the ordered token list,
/// which hands out sequence ids and fixes the listing order in one step.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: DashMap<String, LinkRecord>,
    allocated: RwLock<Vec<Token>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of links allocated so far.
    pub fn len(&self) -> usize {
        self.allocated.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LinkStore for InMemoryStore {
    async fn create_then_assign_token<F>(&self, url: &str, assign: F) -> Result<LinkRecord>
    where
        F: FnOnce(u64) -> Token + Send,
    {
        let mut allocated = self.allocated.write();
        let sequence_id = allocated.len() as u64 + 1;
        check_sequence(sequence_id)?;
        let token = assign(sequence_id);

        if self.records.contains_key(token.as_str()) {
            return Err(StorageError::Operation(format!(
                "token {token} is already assigned"
            )));
        }

        let record = LinkRecord {
            sequence_id,
            token: token.clone(),
            target_url: url.to_string(),
            created_at: Timestamp::now(),
        };
        self.records
            .insert(token.as_str().to_string(), record.clone());
        allocated.push(token);

        debug!(sequence_id, token = %record.token, "allocated link in memory");
        Ok(record)
    }

    async fn find_by_token(&self, token: &Token) -> Result<Option<LinkRecord>> {
        Ok(self
            .records
            .get(token.as_str())
            .map(|entry| entry.value().clone()))
    }

    async fn list_tokens(&self, offset: u64, limit: u64) -> Result<Vec<Token>> {
        let allocated = self.allocated.read();
        Ok(allocated
            .iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}
