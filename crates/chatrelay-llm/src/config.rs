// Provider selection and client construction from configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{LlmError, Result};
use crate::traits::ChatClient;

/// Type of LLM provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    OpenAI,
    Azure,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Azure => "azure",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAI),
            "azure" | "azure_openai" => Ok(ProviderType::Azure),
            other => Err(LlmError::Config(format!("unknown provider: {other}"))),
        }
    }
}

/// Timeouts and retry budget applied to every upstream request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpOptions {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub retry_budget_secs: u64,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            read_timeout_secs: 120,
            retry_budget_secs: 60,
        }
    }
}

/// Configuration for OpenAI provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    /// Defaults to https://api.openai.com/v1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Configuration for Azure OpenAI provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    pub api_key: String,
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderDetails {
    OpenAI(OpenAIConfig),
    Azure(AzureConfig),
}

/// Complete provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(flatten)]
    pub details: ProviderDetails,
    #[serde(default)]
    pub http: HttpOptions,
}

impl ProviderConfig {
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            details: ProviderDetails::OpenAI(OpenAIConfig {
                api_key: api_key.into(),
                model: model.into(),
                base_url: None,
            }),
            http: HttpOptions::default(),
        }
    }

    /// # Arguments
    /// * `endpoint` - resource base URL, e.g. "https://my-resource.openai.azure.com"
    /// * `deployment` - deployment name; the model is implied by it
    /// * `api_version` - e.g. "2025-04-01-preview"
    pub fn azure(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            details: ProviderDetails::Azure(AzureConfig {
                api_key: api_key.into(),
                endpoint: endpoint.into(),
                deployment: deployment.into(),
                api_version: api_version.into(),
            }),
            http: HttpOptions::default(),
        }
    }

    pub fn with_http(mut self, http: HttpOptions) -> Self {
        self.http = http;
        self
    }

    /// Point an OpenAI config at a compatible server; no effect on Azure
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let ProviderDetails::OpenAI(openai) = &mut self.details {
            openai.base_url = base_url;
        }
        self
    }

    pub fn provider_type(&self) -> ProviderType {
        match self.details {
            ProviderDetails::OpenAI(_) => ProviderType::OpenAI,
            ProviderDetails::Azure(_) => ProviderType::Azure,
        }
    }
}

/// Factory for creating chat clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_client(config: ProviderConfig) -> Result<Arc<dyn ChatClient>> {
        match config.details {
            ProviderDetails::OpenAI(openai) => {
                let mut builder = crate::openai::OpenAIClient::builder()
                    .api_key(openai.api_key)
                    .model(openai.model)
                    .http_options(config.http);
                if let Some(base_url) = openai.base_url {
                    builder = builder.base_url(base_url);
                }
                Ok(Arc::new(builder.build()?))
            }
            ProviderDetails::Azure(azure) => {
                let client = crate::azure_openai::AzureOpenAIClient::builder()
                    .api_key(azure.api_key)
                    .endpoint(azure.endpoint)
                    .deployment(azure.deployment)
                    .api_version(azure.api_version)
                    .http_options(config.http)
                    .build()?;
                Ok(Arc::new(client))
            }
        }
    }
}
