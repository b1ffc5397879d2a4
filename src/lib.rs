//! Postrank - batched thoughtfulness scoring for social-media posts
//!
//! Posts submitted by any number of consumers are queued, packed into
//! batches of at most ten, and sent to an LLM provider one batch at a time.
//! Quota exhaustion holds the batch for a delayed retry; every other failure
//! resolves the affected posts to an error value so nothing waits forever.

pub mod cache;
pub mod display;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod rating;
pub mod scheduler;
pub mod settings;

pub use error::{RankerError, Result};
