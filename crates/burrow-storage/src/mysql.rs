use async_trait::async_trait;
use burrow_core::store::{check_sequence, Result};
use burrow_core::{LinkRecord, LinkStore, StorageError, Token};
use jiff::Timestamp;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::{debug, trace};

/// DDL for the `links` table.
///
/// Tokens compare case-sensitively (`utf8mb4_bin`), otherwise the unique
/// index would treat `aB` and `Ab` as the same token.
pub const SCHEMA: &str = include_str!("../ddl/mysql/links.sql");

/// MySQL implementation of [`LinkStore`].
///
/// A link is written in two statements inside one transaction: the row is
/// inserted with a `NULL` token to obtain its `AUTO_INCREMENT` id, then
/// updated with the token derived from that id. Readers never observe a row
/// without its token once the transaction commits.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Creates the `links` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        debug!("links schema is in place");
        Ok(())
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn parse_created_at(seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds).map_err(|e| {
        StorageError::InvalidData(format!("invalid created_at timestamp '{seconds}': {e}"))
    })
}

fn record_from_row(row: &MySqlRow) -> Result<LinkRecord> {
    let sequence_id: u64 = row.try_get("id").map_err(map_sqlx_error)?;
    let token: String = row.try_get("token").map_err(map_sqlx_error)?;
    let target_url: String = row.try_get("target_url").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;

    Ok(LinkRecord {
        sequence_id,
        token: Token::parse(token)?,
        target_url,
        created_at: parse_created_at(created_at)?,
    })
}

#[async_trait]
impl LinkStore for MySqlStore {
    async fn create_then_assign_token<F>(&self, url: &str, assign: F) -> Result<LinkRecord>
    where
        F: FnOnce(u64) -> Token + Send,
    {
        // stored at second precision, so the returned record matches a re-read
        let created_at = parse_created_at(Timestamp::now().as_second())?;

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO links (token, target_url, created_at)
            VALUES (NULL, ?, ?)
            "#,
        )
        .bind(url)
        .bind(created_at.as_second())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let sequence_id = inserted.last_insert_id();
        check_sequence(sequence_id)?;
        let token = assign(sequence_id);
        trace!(sequence_id, token = %token, "assigning token");

        sqlx::query(
            r#"
            UPDATE links
            SET token = ?
            WHERE id = ?
            "#,
        )
        .bind(token.as_str())
        .bind(sequence_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        // dropping `tx` on any error above rolls both statements back
        tx.commit().await.map_err(map_sqlx_error)?;
        debug!(sequence_id, token = %token, "allocated link");

        Ok(LinkRecord {
            sequence_id,
            token,
            target_url: url.to_string(),
            created_at,
        })
    }

    async fn find_by_token(&self, token: &Token) -> Result<Option<LinkRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, token, target_url, created_at
            FROM links
            WHERE token = ?
            LIMIT 1
            "#,
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn list_tokens(&self, offset: u64, limit: u64) -> Result<Vec<Token>> {
        let rows = sqlx::query(
            r#"
            SELECT token
            FROM links
            WHERE token IS NOT NULL
            ORDER BY id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| -> Result<Token> {
                let raw: String = row.try_get("token").map_err(map_sqlx_error)?;
                Ok(Token::parse(raw)?)
            })
            .collect()
    }
}
