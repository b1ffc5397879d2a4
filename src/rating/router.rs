//! Provider selection by model identifier
//!
//! Defines ProviderKind and ModelRouter, a RatingProvider that forwards each
//! call to the variant serving the configured model.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::WorkItem;
use crate::rating::provider::{ClassifiedOutcome, RatingConfig, RatingProvider};

/// The two supported request/response formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Anthropic,
}

impl ProviderKind {
    /// Claude models go to Anthropic; everything else is treated as Gemini
    pub fn for_model(model: &str) -> Self {
        if model.trim().to_ascii_lowercase().starts_with("claude") {
            ProviderKind::Anthropic
        } else {
            ProviderKind::Gemini
        }
    }

    /// Environment variable holding this provider's API key
    pub fn key_env_var(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

/// Routes each call to the provider serving the configured model
pub struct ModelRouter {
    gemini: Arc<dyn RatingProvider>,
    anthropic: Arc<dyn RatingProvider>,
}

impl ModelRouter {
    pub fn new(gemini: Arc<dyn RatingProvider>, anthropic: Arc<dyn RatingProvider>) -> Self {
        Self { gemini, anthropic }
    }

    /// The provider that would serve `model`
    pub fn select(&self, model: &str) -> &Arc<dyn RatingProvider> {
        match ProviderKind::for_model(model) {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::Anthropic => &self.anthropic,
        }
    }
}

#[async_trait]
impl RatingProvider for ModelRouter {
    async fn call(&self, batch: &[WorkItem], config: &RatingConfig) -> ClassifiedOutcome {
        let provider = self.select(&config.model);
        tracing::debug!(provider = provider.name(), model = %config.model, "Routing rating call");
        provider.call(batch, config).await
    }

    fn name(&self) -> &str {
        "router"
    }
}
