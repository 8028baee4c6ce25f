mod chat_message;
mod history;

pub use chat_message::{ChatMessage, NewChatMessage};
pub use history::{HistoryPage, HistoryQuery, MAX_HISTORY_LIMIT};
