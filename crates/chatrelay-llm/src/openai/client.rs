// OpenAI-specific client implementation

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::config::{HttpOptions, ProviderType};
use crate::error::{LlmError, Result};
use crate::payload::build_chat_payload;
use crate::retry::RetryPolicy;
use crate::streaming::parse_chat_sse_stream;
use crate::traits::{ChatClient, ChatRequest, FragmentStream};
use crate::transport::{read_completion_text, HttpTransport};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI client (HTTP direct, no SDK)
#[derive(Debug)]
pub struct OpenAIClient {
    transport: HttpTransport,
    base_url: String,
    model: String,
}

impl OpenAIClient {
    /// Client against the public API with default timeouts
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).model(model).build()
    }

    pub fn builder() -> OpenAIClientBuilder {
        OpenAIClientBuilder::default()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn model_for<'a>(&'a self, request: &'a ChatRequest) -> &'a str {
        request.options.model.as_deref().unwrap_or(&self.model)
    }
}

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn generate(&self, request: ChatRequest) -> Result<String> {
        let payload = build_chat_payload(&request, Some(self.model_for(&request)), false);
        let response = self.transport.post_json(&self.completions_url(), &payload).await?;
        read_completion_text(response).await
    }

    async fn generate_stream(&self, request: ChatRequest) -> Result<FragmentStream> {
        let payload = build_chat_payload(&request, Some(self.model_for(&request)), true);
        let response = self.transport.post_json(&self.completions_url(), &payload).await?;

        tracing::debug!(model = %self.model_for(&request), "OpenAI stream opened");
        Ok(parse_chat_sse_stream(response.bytes_stream()))
    }

    fn provider(&self) -> ProviderType {
        ProviderType::OpenAI
    }
}

/// Builder for OpenAIClient
#[derive(Debug, Default)]
pub struct OpenAIClientBuilder {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    http: HttpOptions,
    retry: Option<RetryPolicy>,
}

impl OpenAIClientBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Model sent with every request unless the request overrides it
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Point at an OpenAI-compatible server instead of api.openai.com
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn http_options(mut self, http: HttpOptions) -> Self {
        self.http = http;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn build(self) -> Result<OpenAIClient> {
        let api_key = self
            .api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| LlmError::Config("OpenAI API key is required".to_string()))?;
        let model = self
            .model
            .filter(|m| !m.is_empty())
            .ok_or_else(|| LlmError::Config("OpenAI model is required".to_string()))?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| OPENAI_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|_| LlmError::Config("invalid API key format".to_string()))?,
        );

        let mut transport = HttpTransport::new(headers, &self.http)?;
        if let Some(retry) = self.retry {
            transport = transport.with_retry(retry);
        }

        Ok(OpenAIClient {
            transport,
            base_url,
            model,
        })
    }
}
