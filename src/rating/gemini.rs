//! Gemini rating provider
//!
//! Sends the batch prompt to the `generateContent` endpoint and reads the
//! answer from `candidates[0].content.parts[0].text`.

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

/// Gemini API base URL
pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the Gemini provider
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: GEMINI_API_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl GeminiConfig {
    /// Point the provider at another host (local mock servers in tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Gemini `generateContent` client
#[derive(Debug)]
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RankerError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.config.base_url.trim_end_matches('/'), model)
    }

    /// Build the request body; temperature 0 keeps scores reproducible
    fn build_request(&self, prompt: &str) -> Value {
        json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": 0
            }
        })
    }

    fn extract_text(body: &Value) -> std::result::Result<String, ProviderError> {
        body.pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ProviderError::MissingField("candidates[0].content.parts[0].text"))
    }

    async fn request(&self, batch: &[WorkItem], config: &RatingConfig) -> std::result::Result<String, ProviderError> {
        if !config.has_credential() {
            return Err(ProviderError::MissingCredential);
        }

        let body = self.build_request(&build_prompt(batch, &config.criteria));
        let request = self
            .client
            .post(self.endpoint(&config.model))
            .header("x-goog-api-key", &config.credential);

        let response = send_json(request, &body).await?;
        Self::extract_text(&response)
    }
}

#[async_trait]
impl RatingProvider for GeminiProvider {
    async fn call(&self, batch: &[WorkItem], config: &RatingConfig) -> ClassifiedOutcome {
        classify_response(self.request(batch, config).await, batch.len())
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CriteriaSet, FailureCode, RatingValue};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "gemini-1.5-flash-latest";

    fn config() -> RatingConfig {
        RatingConfig::new("test-key", MODEL, CriteriaSet::default())
    }

    fn batch(n: usize) -> Vec<WorkItem> {
        (1..=n).map(|i| WorkItem::new(format!("id{}", i), format!("post {}", i))).collect()
    }

    fn answer(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": "STOP"
            }]
        })
    }

    async fn provider_for(server: &MockServer) -> GeminiProvider {
        GeminiProvider::new(GeminiConfig::with_base_url(server.uri())).unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = GeminiConfig::default();
        assert_eq!(config.base_url, GEMINI_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_endpoint_includes_model() {
        let provider = GeminiProvider::new(GeminiConfig::with_base_url("http://localhost:1/")).unwrap();
        assert_eq!(
            provider.endpoint(MODEL),
            "http://localhost:1/models/gemini-1.5-flash-latest:generateContent"
        );
    }

    #[test]
    fn test_build_request_shape() {
        let provider = GeminiProvider::new(GeminiConfig::default()).unwrap();
        let body = provider.build_request("rate these");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "rate these");
        assert_eq!(body["generationConfig"]["temperature"], 0);
    }

    #[test]
    fn test_extract_text_missing_parts() {
        let body = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        let err = GeminiProvider::extract_text(&body).unwrap_err();
        assert!(matches!(err, ProviderError::MissingField(_)));
    }

    #[tokio::test]
    async fn test_call_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/models/{}:generateContent", MODEL)))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({ "generationConfig": { "temperature": 0 } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer("7, 3, 9")))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = provider_for(&server).await.call(&batch(3), &config()).await;
        assert_eq!(
            outcome,
            ClassifiedOutcome::Rated(vec![RatingValue::Score(7), RatingValue::Score(3), RatingValue::Score(9)])
        );
    }

    #[tokio::test]
    async fn test_call_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let outcome = provider_for(&server).await.call(&batch(1), &config()).await;
        assert_eq!(outcome, ClassifiedOutcome::QuotaExhausted);
    }

    #[tokio::test]
    async fn test_call_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let outcome = provider_for(&server).await.call(&batch(2), &config()).await;
        assert_eq!(outcome, ClassifiedOutcome::HardFailure(FailureCode::RequestFailed));
    }

    #[tokio::test]
    async fn test_call_missing_content_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [{ "content": {} }] })))
            .mount(&server)
            .await;

        let outcome = provider_for(&server).await.call(&batch(1), &config()).await;
        assert_eq!(outcome, ClassifiedOutcome::HardFailure(FailureCode::MalformedResponse));
    }

    #[tokio::test]
    async fn test_call_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let outcome = provider_for(&server).await.call(&batch(1), &config()).await;
        assert_eq!(outcome, ClassifiedOutcome::HardFailure(FailureCode::MalformedResponse));
    }

    #[tokio::test]
    async fn test_call_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer("5")).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(GeminiConfig {
            base_url: server.uri(),
            timeout: Duration::from_millis(100),
        })
        .unwrap();

        let outcome = provider.call(&batch(1), &config()).await;
        assert_eq!(outcome, ClassifiedOutcome::HardFailure(FailureCode::TransportError));
    }

    #[tokio::test]
    async fn test_call_connection_refused_is_transport_error() {
        // Port 9 (discard) is not expected to accept HTTP connections locally
        let provider = GeminiProvider::new(GeminiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(2),
        })
        .unwrap();

        let outcome = provider.call(&batch(1), &config()).await;
        assert_eq!(outcome, ClassifiedOutcome::HardFailure(FailureCode::TransportError));
    }

    #[tokio::test]
    async fn test_call_without_credential_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer("5")))
            .expect(0)
            .mount(&server)
            .await;

        let unconfigured = RatingConfig::new("", MODEL, CriteriaSet::default());
        let outcome = provider_for(&server).await.call(&batch(1), &unconfigured).await;
        assert_eq!(outcome, ClassifiedOutcome::Unconfigured);
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GeminiProvider>();
    }
}
