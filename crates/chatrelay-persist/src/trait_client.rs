use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChatMessage, HistoryPage, HistoryQuery, NewChatMessage};

/// Trait for transcript persistence
///
/// Implementations must be safe to call from many sessions at once.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message and return it with its assigned id
    async fn insert(&self, message: NewChatMessage) -> Result<ChatMessage>;

    /// The `limit` most recent messages, oldest first
    async fn recent(&self, limit: u32) -> Result<Vec<ChatMessage>>;

    /// A page of history ordered newest-first before paging, returned oldest-first
    async fn list(&self, query: HistoryQuery) -> Result<HistoryPage>;

    /// Delete every message; returns how many were removed
    async fn clear(&self) -> Result<u64>;

    /// Cheap liveness check for health reporting
    async fn ping(&self) -> Result<()>;
}
