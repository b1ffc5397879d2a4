//! Anthropic rating provider
//!
//! This module implements the RatingProvider trait for the Anthropic (Claude)
//! Messages API. The answer is the first `text` block of the response content.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::domain::WorkItem;
use crate::error::{RankerError, Result};
use crate::rating::prompt::build_prompt;
use crate::rating::provider::{
    ClassifiedOutcome, ProviderError, RatingConfig, RatingProvider, classify_response, send_json,
};

/// Anthropic API URL
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default max tokens; a line of ten numbers needs far fewer
const DEFAULT_MAX_TOKENS: u32 = 256;

/// Configuration for the Anthropic provider
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub url: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            url: ANTHROPIC_API_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(60),
        }
    }
}

impl AnthropicConfig {
    /// Create a config posting to a custom URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Anthropic Messages API client
pub struct AnthropicProvider {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RankerError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Build the request body for the Anthropic API
    fn build_request(&self, model: &str, prompt: &str) -> Value {
        json!({
            "model": model,
            "max_tokens": self.config.max_tokens,
            "temperature": 0,
            "messages": [{
                "role": "user",
                "content": prompt
            }]
        })
    }

    fn extract_text(body: &Value) -> std::result::Result<String, ProviderError> {
        body["content"]
            .as_array()
            .and_then(|blocks| {
                blocks
                    .iter()
                    .find(|block| block["type"].as_str() == Some("text"))
                    .and_then(|block| block["text"].as_str())
            })
            .map(str::to_string)
            .ok_or(ProviderError::MissingField("content[].text"))
    }

    async fn request(&self, batch: &[WorkItem], config: &RatingConfig) -> std::result::Result<String, ProviderError> {
        if !config.has_credential() {
            return Err(ProviderError::MissingCredential);
        }

        let body = self.build_request(&config.model, &build_prompt(batch, &config.criteria));
        let request = self
            .client
            .post(&self.config.url)
            .header("x-api-key", &config.credential)
            .header("anthropic-version", ANTHROPIC_VERSION);

        let response = send_json(request, &body).await?;
        Self::extract_text(&response)
    }
}

#[async_trait]
impl RatingProvider for AnthropicProvider {
    async fn call(&self, batch: &[WorkItem], config: &RatingConfig) -> ClassifiedOutcome {
        classify_response(self.request(batch, config).await, batch.len())
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("url", &self.config.url)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}
