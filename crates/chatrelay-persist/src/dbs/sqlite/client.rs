use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

use crate::dbs::sqlite::models::{escape_like, format_timestamp, ChatMessageRow, SCHEMA};
use crate::error::Result;
use crate::models::{ChatMessage, HistoryPage, HistoryQuery, NewChatMessage};
use crate::trait_client::MessageStore;

const SEARCH_CLAUSE: &str = "content LIKE '%' || ? || '%' ESCAPE '\\'";

/// [`MessageStore`] backed by a SQLite database in WAL mode
#[derive(Debug, Clone)]
pub struct SqliteMessageStore {
    pool: SqlitePool,
}

impl SqliteMessageStore {
    /// Open (creating if missing) the database at `database_url` and ensure the schema
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database, used by tests and ephemeral runs
    ///
    /// A single connection that never expires, since each new connection to
    /// `:memory:` would see an empty database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        tracing::debug!("chat_messages schema ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn rows_to_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<ChatMessage>> {
        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            messages.push(ChatMessageRow::from_row(row)?.into_message()?);
        }
        Ok(messages)
    }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn insert(&self, message: NewChatMessage) -> Result<ChatMessage> {
        let result = sqlx::query(
            r#"INSERT INTO chat_messages (role, content, timestamp, model, temperature, max_tokens)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(format_timestamp(&message.timestamp))
        .bind(&message.model)
        .bind(message.temperature.map(f64::from))
        .bind(message.max_tokens.map(i64::from))
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(id, role = %message.role, "Message stored");

        Ok(ChatMessage {
            id,
            role: message.role,
            content: message.content,
            timestamp: message.timestamp,
            model: message.model,
            temperature: message.temperature,
            max_tokens: message.max_tokens,
        })
    }

    async fn recent(&self, limit: u32) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query(
            "SELECT * FROM chat_messages ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut messages = Self::rows_to_messages(&rows)?;
        messages.reverse();
        Ok(messages)
    }

    async fn list(&self, query: HistoryQuery) -> Result<HistoryPage> {
        let limit = i64::from(query.effective_limit());
        let offset = i64::from(query.offset);
        let search = query.search_term().map(escape_like);

        let (total, rows) = match &search {
            Some(term) => {
                let total: i64 = sqlx::query_scalar(&format!(
                    "SELECT COUNT(*) FROM chat_messages WHERE {SEARCH_CLAUSE}"
                ))
                .bind(term)
                .fetch_one(&self.pool)
                .await?;

                let rows = sqlx::query(&format!(
                    "SELECT * FROM chat_messages WHERE {SEARCH_CLAUSE}
                     ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?"
                ))
                .bind(term)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;

                (total, rows)
            }
            None => {
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages")
                    .fetch_one(&self.pool)
                    .await?;

                let rows = sqlx::query(
                    "SELECT * FROM chat_messages ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?",
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;

                (total, rows)
            }
        };

        let mut messages = Self::rows_to_messages(&rows)?;
        messages.reverse();

        Ok(HistoryPage {
            messages,
            total: total.max(0) as u64,
        })
    }

    async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chat_messages")
            .execute(&self.pool)
            .await?;
        tracing::info!(deleted = result.rows_affected(), "Chat history cleared");
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
