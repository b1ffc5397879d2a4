//! Domain types for Postrank
//!
//! This module contains the values that flow through the rating pipeline:
//! - WorkItem: a post to score, tagged with the consumer that submitted it
//! - RatingResult / RatingValue: what comes back for each item
//! - FailureCode: terminal, non-retried failure reasons
//! - Criterion / CriteriaSet: weighted scoring dimensions fed into the prompt

pub mod criteria;
pub mod item;
pub mod rating;

pub use criteria::{CriteriaSet, Criterion, MAX_WEIGHT};
pub use item::{ConsumerId, WorkItem};
pub use rating::{FailureCode, RANK_MAX, RANK_MIN, RatingResult, RatingValue};
