pub mod models;
pub mod trait_client;
pub mod dbs;
pub mod error;

pub use models::{ChatMessage, HistoryPage, HistoryQuery, NewChatMessage, MAX_HISTORY_LIMIT};
pub use trait_client::MessageStore;
pub use dbs::sqlite::SqliteMessageStore;
pub use error::{PersistError, Result};
