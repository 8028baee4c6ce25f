use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use crate::error::{PersistError, Result};
use crate::models::ChatMessage;

pub(super) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chat_messages (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    role        TEXT NOT NULL,
    content     TEXT NOT NULL,
    timestamp   TEXT NOT NULL,
    model       TEXT,
    temperature REAL,
    max_tokens  INTEGER
);
CREATE INDEX IF NOT EXISTS idx_chat_messages_timestamp ON chat_messages (timestamp, id);
"#;

/// Raw `chat_messages` row as SQLite stores it
pub(super) struct ChatMessageRow {
    id: i64,
    role: String,
    content: String,
    timestamp: String,
    model: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<i64>,
}

impl ChatMessageRow {
    pub(super) fn from_row(row: &sqlx::sqlite::SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            timestamp: row.try_get("timestamp")?,
            model: row.try_get("model")?,
            temperature: row.try_get("temperature")?,
            max_tokens: row.try_get("max_tokens")?,
        })
    }

    pub(super) fn into_message(self) -> Result<ChatMessage> {
        let role = self.role.parse().map_err(PersistError::InvalidRow)?;
        let timestamp = parse_timestamp(&self.timestamp)?;
        let max_tokens = self
            .max_tokens
            .map(u32::try_from)
            .transpose()
            .map_err(|e| PersistError::InvalidRow(format!("invalid max_tokens: {e}")))?;

        Ok(ChatMessage {
            id: self.id,
            role,
            content: self.content,
            timestamp,
            model: self.model,
            temperature: self.temperature.map(|t| t as f32),
            max_tokens,
        })
    }
}

/// Fixed-width UTC text so lexical order matches chronological order
pub(super) fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(super) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PersistError::InvalidRow(format!("invalid timestamp {s:?}: {e}")))
}

/// Escape `%`, `_` and `\` so user input matches literally under `LIKE ... ESCAPE '\'`
pub(super) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
