//! Rating Client Layer - turns a batch of posts into per-item ratings
//!
//! This module provides:
//! - RatingProvider trait: one outbound request per batch, classified outcome back
//! - Prompt construction with the weighted criteria clause
//! - Comma-separated rating parsing with per-item failure granularity
//! - GeminiProvider and AnthropicProvider implementations
//! - ModelRouter selecting between them by model identifier
//! - MockProvider for tests and dry runs

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod parse;
pub mod prompt;
pub mod provider;
pub mod router;

pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use gemini::{GeminiConfig, GeminiProvider};
pub use mock::{MockProvider, MockReply};
pub use parse::parse_ratings;
pub use prompt::build_prompt;
pub use provider::{ClassifiedOutcome, ProviderError, RatingConfig, RatingProvider};
pub use router::{ModelRouter, ProviderKind};
