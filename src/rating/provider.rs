//! Core rating provider types and trait definitions

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{CriteriaSet, FailureCode, RatingValue, WorkItem};
use crate::rating::parse::parse_ratings;

/// Stateless rating adapter - exactly one network call per batch
#[async_trait]
pub trait RatingProvider: Send + Sync {
    /// Rate every item of `batch` using the given configuration snapshot
    async fn call(&self, batch: &[WorkItem], config: &RatingConfig) -> ClassifiedOutcome;

    /// Short provider name for logs
    fn name(&self) -> &str;
}

/// Everything a provider needs from the live configuration.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RatingConfig {
    /// API key; empty means not configured
    pub credential: String,
    /// Model identifier, also used to pick the provider
    pub model: String,
    pub criteria: CriteriaSet,
}

impl RatingConfig {
    pub fn new(credential: impl Into<String>, model: impl Into<String>, criteria: CriteriaSet) -> Self {
        Self {
            credential: credential.into(),
            model: model.into(),
            criteria,
        }
    }

    pub fn has_credential(&self) -> bool {
        !self.credential.trim().is_empty()
    }
}

// Never print the credential
impl fmt::Debug for RatingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RatingConfig")
            .field("credential", &if self.has_credential() { "<set>" } else { "<unset>" })
            .field("model", &self.model)
            .field("criteria", &self.criteria)
            .finish()
    }
}

/// Result of one provider call, already classified for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedOutcome {
    /// One value per batch item, in batch order
    Rated(Vec<RatingValue>),
    /// Provider asked us to slow down; the whole batch is retried later
    QuotaExhausted,
    /// The whole batch failed for the same reason
    HardFailure(FailureCode),
    /// No credential at call time
    Unconfigured,
}

impl ClassifiedOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifiedOutcome::Rated(_) => "rated",
            ClassifiedOutcome::QuotaExhausted => "quota_exhausted",
            ClassifiedOutcome::HardFailure(_) => "hard_failure",
            ClassifiedOutcome::Unconfigured => "unconfigured",
        }
    }
}

/// Raw failures a provider can hit before a rating text is available
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Rate limited (status {status})")]
    RateLimited { status: u16 },

    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Response missing field {0}")]
    MissingField(&'static str),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("No credential configured")]
    MissingCredential,
}

impl ProviderError {
    /// Map this failure onto the outcome the scheduler acts on
    pub fn classify(&self) -> ClassifiedOutcome {
        match self {
            ProviderError::RateLimited { .. } => ClassifiedOutcome::QuotaExhausted,
            ProviderError::Status { .. } => ClassifiedOutcome::HardFailure(FailureCode::RequestFailed),
            ProviderError::Malformed(_) | ProviderError::MissingField(_) => {
                ClassifiedOutcome::HardFailure(FailureCode::MalformedResponse)
            }
            ProviderError::Network(_) | ProviderError::Timeout(_) => {
                ClassifiedOutcome::HardFailure(FailureCode::TransportError)
            }
            ProviderError::MissingCredential => ClassifiedOutcome::Unconfigured,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }
}

/// Classify the result of a single request that yields the model's text
pub fn classify_response(result: Result<String, ProviderError>, batch_len: usize) -> ClassifiedOutcome {
    match result {
        Ok(text) => ClassifiedOutcome::Rated(parse_ratings(&text, batch_len)),
        Err(e) => {
            tracing::warn!(error = %e, retryable = e.is_retryable(), "Rating request failed");
            e.classify()
        }
    }
}

/// Send a JSON request and return the decoded JSON body of a 2xx response
pub(crate) async fn send_json(request: reqwest::RequestBuilder, body: &Value) -> Result<Value, ProviderError> {
    let response = request
        .header("content-type", "application/json")
        .json(body)
        .send()
        .await?;

    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited {
            status: status.as_u16(),
        });
    }

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(ProviderError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ProviderError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Criterion;

    #[test]
    fn test_classify_each_error() {
        assert_eq!(
            ProviderError::RateLimited { status: 429 }.classify(),
            ClassifiedOutcome::QuotaExhausted
        );
        assert_eq!(
            ProviderError::Status {
                status: 500,
                message: "boom".into()
            }
            .classify(),
            ClassifiedOutcome::HardFailure(FailureCode::RequestFailed)
        );
        assert_eq!(
            ProviderError::MissingField("content.parts").classify(),
            ClassifiedOutcome::HardFailure(FailureCode::MalformedResponse)
        );
        assert_eq!(
            ProviderError::Malformed("expected value".into()).classify(),
            ClassifiedOutcome::HardFailure(FailureCode::MalformedResponse)
        );
        assert_eq!(
            ProviderError::Timeout(Duration::from_secs(1)).classify(),
            ClassifiedOutcome::HardFailure(FailureCode::TransportError)
        );
        assert_eq!(ProviderError::MissingCredential.classify(), ClassifiedOutcome::Unconfigured);
    }

    #[test]
    fn test_only_rate_limit_is_retryable() {
        assert!(ProviderError::RateLimited { status: 429 }.is_retryable());
        assert!(
            !ProviderError::Status {
                status: 503,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(!ProviderError::MissingField("x").is_retryable());
    }

    #[test]
    fn test_classify_response_ok_parses_text() {
        let outcome = classify_response(Ok("7, 3, 9".to_string()), 3);
        assert_eq!(
            outcome,
            ClassifiedOutcome::Rated(vec![RatingValue::Score(7), RatingValue::Score(3), RatingValue::Score(9)])
        );
    }

    #[test]
    fn test_classify_response_err() {
        let outcome = classify_response(Err(ProviderError::RateLimited { status: 429 }), 2);
        assert_eq!(outcome, ClassifiedOutcome::QuotaExhausted);
    }

    #[test]
    fn test_rating_config_debug_hides_credential() {
        let config = RatingConfig::new("secret-key-123", "gemini-1.5-flash-latest", vec![Criterion::new("depth", 2)].into());
        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("gemini-1.5-flash-latest"));
        assert!(debug_str.contains("<set>"));
        assert!(!debug_str.contains("secret-key-123"));
    }

    #[test]
    fn test_has_credential() {
        assert!(!RatingConfig::default().has_credential());
        assert!(!RatingConfig::new("   ", "m", CriteriaSet::default()).has_credential());
        assert!(RatingConfig::new("k", "m", CriteriaSet::default()).has_credential());
    }

    #[test]
    fn test_outcome_kind() {
        assert_eq!(ClassifiedOutcome::Rated(vec![]).kind(), "rated");
        assert_eq!(ClassifiedOutcome::QuotaExhausted.kind(), "quota_exhausted");
        assert_eq!(ClassifiedOutcome::HardFailure(FailureCode::RequestFailed).kind(), "hard_failure");
        assert_eq!(ClassifiedOutcome::Unconfigured.kind(), "unconfigured");
    }
}
