use reqwest::header::HeaderMap;
use serde_json::Value;
use std::time::Duration;

use crate::config::HttpOptions;
use crate::error::{LlmError, Result};
use crate::retry::RetryPolicy;

/// Pooled HTTP client shared by both backends, with retry on the request phase
#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub(crate) fn new(headers: HeaderMap, options: &HttpOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(options.connect_timeout_secs))
            .read_timeout(Duration::from_secs(options.read_timeout_secs))
            .build()
            .map_err(|e| LlmError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            retry: RetryPolicy::default()
                .with_max_elapsed(Duration::from_secs(options.retry_budget_secs)),
        })
    }

    pub(crate) fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// POST `payload` and return the response once a 2xx status line arrived
    ///
    /// The body is not read here, so retries never replay output the caller
    /// has already seen.
    pub(crate) async fn post_json(&self, url: &str, payload: &Value) -> Result<reqwest::Response> {
        let client = &self.client;

        self.retry
            .run("chat_completion", move || async move {
                let response = client.post(url).json(payload).send().await?;
                let status = response.status();

                if status.is_success() {
                    return Ok(response);
                }

                let body = response.text().await.unwrap_or_default();
                Err(LlmError::Http {
                    status: status.as_u16(),
                    body,
                })
            })
            .await
    }
}

/// `choices[0].message.content` of a non-streamed completion
pub(crate) async fn read_completion_text(response: reqwest::Response) -> Result<String> {
    let body: Value = response.json().await?;

    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| LlmError::InvalidResponse("missing choices[0].message.content".to_string()))
}
