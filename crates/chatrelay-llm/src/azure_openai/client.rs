// Azure OpenAI-specific client implementation

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use crate::config::{HttpOptions, ProviderType};
use crate::error::{LlmError, Result};
use crate::payload::build_chat_payload;
use crate::retry::RetryPolicy;
use crate::streaming::parse_chat_sse_stream;
use crate::traits::{ChatClient, ChatRequest, FragmentStream};
use crate::transport::{read_completion_text, HttpTransport};

pub const DEFAULT_API_VERSION: &str = "2025-04-01-preview";

/// Azure OpenAI client (HTTP direct, no SDK)
///
/// Azure differs from OpenAI in three ways:
/// - URL: {endpoint}/openai/deployments/{deployment}/chat/completions?api-version=...
/// - Auth header: `api-key` instead of `Authorization: Bearer`
/// - The deployment implies the model, so the body carries none
#[derive(Debug)]
pub struct AzureOpenAIClient {
    transport: HttpTransport,
    url: String,
    deployment: String,
}

impl AzureOpenAIClient {
    pub fn builder() -> AzureOpenAIClientBuilder {
        AzureOpenAIClientBuilder::default()
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    pub fn completions_url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatClient for AzureOpenAIClient {
    async fn generate(&self, request: ChatRequest) -> Result<String> {
        let payload = build_chat_payload(&request, None, false);
        let response = self.transport.post_json(&self.url, &payload).await?;
        read_completion_text(response).await
    }

    async fn generate_stream(&self, request: ChatRequest) -> Result<FragmentStream> {
        let payload = build_chat_payload(&request, None, true);
        let response = self.transport.post_json(&self.url, &payload).await?;

        tracing::debug!(deployment = %self.deployment, "Azure OpenAI stream opened");
        Ok(parse_chat_sse_stream(response.bytes_stream()))
    }

    fn provider(&self) -> ProviderType {
        ProviderType::Azure
    }
}

/// Builder for AzureOpenAIClient
#[derive(Debug, Default)]
pub struct AzureOpenAIClientBuilder {
    api_key: Option<String>,
    endpoint: Option<String>,
    deployment: Option<String>,
    api_version: Option<String>,
    http: HttpOptions,
    retry: Option<RetryPolicy>,
}

impl AzureOpenAIClientBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the Azure OpenAI endpoint (base URL)
    /// Example: "https://my-resource.openai.azure.com"
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = Some(deployment.into());
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
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

    pub fn build(self) -> Result<AzureOpenAIClient> {
        let api_key = required(self.api_key, "Azure OpenAI API key")?;
        let endpoint = required(self.endpoint, "Azure OpenAI endpoint")?;
        let deployment = required(self.deployment, "Azure OpenAI deployment")?;
        let api_version = self
            .api_version
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            api_version
        );

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "api-key",
            HeaderValue::from_str(&api_key)
                .map_err(|_| LlmError::Config("invalid API key format".to_string()))?,
        );

        let mut transport = HttpTransport::new(headers, &self.http)?;
        if let Some(retry) = self.retry {
            transport = transport.with_retry(retry);
        }

        Ok(AzureOpenAIClient {
            transport,
            url,
            deployment,
        })
    }
}

fn required(value: Option<String>, what: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| LlmError::Config(format!("{what} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_shape() {
        let client = AzureOpenAIClient::builder()
            .api_key("k")
            .endpoint("https://my-resource.openai.azure.com/")
            .deployment("gpt4o")
            .api_version("2024-02-15-preview")
            .build()
            .unwrap();

        assert_eq!(
            client.completions_url(),
            "https://my-resource.openai.azure.com/openai/deployments/gpt4o/chat/completions?api-version=2024-02-15-preview"
        );
        assert_eq!(client.provider(), ProviderType::Azure);
    }

    #[test]
    fn test_default_api_version() {
        let client = AzureOpenAIClient::builder()
            .api_key("k")
            .endpoint("https://r.openai.azure.com")
            .deployment("d")
            .build()
            .unwrap();
        assert!(client.completions_url().ends_with(DEFAULT_API_VERSION));
    }

    #[test]
    fn test_missing_endpoint_or_deployment() {
        let no_endpoint = AzureOpenAIClient::builder().api_key("k").deployment("d").build();
        assert!(matches!(no_endpoint, Err(LlmError::Config(msg)) if msg.contains("endpoint")));

        let no_deployment = AzureOpenAIClient::builder()
            .api_key("k")
            .endpoint("https://r.openai.azure.com")
            .build();
        assert!(matches!(no_deployment, Err(LlmError::Config(msg)) if msg.contains("deployment")));
    }
}
