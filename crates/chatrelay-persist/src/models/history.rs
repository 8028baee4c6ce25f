use serde::{Deserialize, Serialize};

use super::ChatMessage;

/// Upper bound on a single history page
pub const MAX_HISTORY_LIMIT: u32 = 100;

/// Paging and filtering for transcript listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryQuery {
    pub limit: u32,
    pub offset: u32,
    /// Substring match on content, ASCII case-insensitive
    pub search: Option<String>,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
            search: None,
        }
    }
}

impl HistoryQuery {
    /// Limit clamped to `1..=MAX_HISTORY_LIMIT`
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_HISTORY_LIMIT)
    }

    /// Search term with surrounding whitespace removed; blank means no filter
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// One page of transcript, oldest first, plus the total matching count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub messages: Vec<ChatMessage>,
    pub total: u64,
}
