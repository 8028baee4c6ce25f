pub mod types;
pub mod traits;
pub mod error;
pub mod prompts;
pub mod retry;
pub mod streaming;
pub mod buffer_utils;
pub mod config;
pub mod openai;
pub mod azure_openai;

mod payload;
mod transport;

pub use traits::{ChatClient, ChatRequest, ChatOptions, FragmentStream};
pub use error::{LlmError, Result};
pub use retry::RetryPolicy;
pub use config::{ProviderType, ProviderConfig, HttpOptions, ClientFactory};
pub use openai::{OpenAIClient, OpenAIClientBuilder};
pub use azure_openai::{AzureOpenAIClient, AzureOpenAIClientBuilder};
pub use types::{Message, Role};
