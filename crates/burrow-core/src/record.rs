use crate::token::Token;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A stored link, owned by the [`LinkStore`](crate::LinkStore).
///
/// Records are immutable once created. Caches and the existence filter
/// only ever hold projections of one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Store-assigned, monotonically increasing id.
    pub sequence_id: u64,
    /// Always `Token::from_sequence(sequence_id)`.
    pub token: Token,
    /// The URL the token resolves to.
    pub target_url: String,
    pub created_at: Timestamp,
}
