//! Error types for Postrank
//!
//! Centralized error handling using thiserror. Rating failures never surface
//! here: they are converted to per-item values before they leave the scheduler.

use thiserror::Error;

/// Errors raised while assembling the pipeline
#[derive(Debug, Error)]
pub enum RankerError {
    /// A provider could not be constructed
    #[error("Provider error: {0}")]
    Provider(String),

    /// The scheduler was built outside a tokio runtime
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type alias for Postrank operations
pub type Result<T> = std::result::Result<T, RankerError>;
