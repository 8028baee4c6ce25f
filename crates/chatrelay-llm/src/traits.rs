use crate::config::ProviderType;
use crate::error::{LlmError, Result};
use crate::types::Message;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Lazy, finite sequence of generated text fragments in arrival order
pub type FragmentStream = Pin<Box<dyn Stream<Item = std::result::Result<String, LlmError>> + Send>>;

/// Chat-completion client for a single upstream backend
///
/// Both operations retry transient failures before any output reaches the
/// caller. Once `generate_stream` has returned, errors surface as stream items
/// and nothing is retried.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Single round trip returning the full completion text
    async fn generate(&self, request: ChatRequest) -> Result<String>;

    /// Streaming completion; dropping the stream releases the connection
    async fn generate_stream(&self, request: ChatRequest) -> Result<FragmentStream>;

    fn provider(&self) -> ProviderType;
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    /// Slash command selecting a canned system prompt, e.g. `/explain`
    pub command: Option<String>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            command: None,
            options: ChatOptions::default(),
        }
    }

    pub fn with_command(mut self, command: Option<String>) -> Self {
        self.command = command;
        self
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatOptions {
    /// Overrides the client's default model; ignored by deployment-addressed backends
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = temp;
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }
}
