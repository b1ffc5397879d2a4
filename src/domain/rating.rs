//! Rating values delivered back to consumers.
//!
//! A rating is one of three states: an integer score, `null` (deferred, a
//! retry path exists), or a terminal [`FailureCode`]. On the wire this is a
//! JSON number, `null`, or a string respectively.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest score shown as a rank; the prompt asks for 1-10 but 0 is tolerated
pub const RANK_MIN: i64 = 0;

/// Highest score shown as a rank
pub const RANK_MAX: i64 = 10;

/// Terminal failure for a single item. Never retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureCode {
    /// Non-2xx response that was not a quota signal
    RequestFailed,
    /// 2xx response without the expected nested text field
    MalformedResponse,
    /// The segment for this item was not an integer (or was missing)
    UnparsableRating,
    /// Network failure, timeout, or other exception during the call
    TransportError,
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureCode::RequestFailed => "RequestFailed",
            FailureCode::MalformedResponse => "MalformedResponse",
            FailureCode::UnparsableRating => "UnparsableRating",
            FailureCode::TransportError => "TransportError",
        };
        write!(f, "{}", s)
    }
}

/// The rating attached to one work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatingValue {
    /// Model-assigned score, passed through without clamping
    Score(i64),
    /// Terminal failure for this item
    Failed(FailureCode),
    /// Not rated yet; a retry is scheduled or a credential is missing
    Deferred,
}

impl RatingValue {
    /// The score, if this is one
    pub fn score(&self) -> Option<i64> {
        match self {
            RatingValue::Score(n) => Some(*n),
            _ => None,
        }
    }

    /// True for scores and failure codes; false for deferred
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RatingValue::Deferred)
    }

    /// The score when it can be shown as `n/10`; out-of-range scores give None
    pub fn rank(&self) -> Option<i64> {
        self.score().filter(|n| (RANK_MIN..=RANK_MAX).contains(n))
    }
}

impl From<FailureCode> for RatingValue {
    fn from(code: FailureCode) -> Self {
        RatingValue::Failed(code)
    }
}

/// Rating for one work item, produced once per processing attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingResult {
    pub id: String,
    pub rating: RatingValue,
}

impl RatingResult {
    pub fn new(id: impl Into<String>, rating: RatingValue) -> Self {
        Self {
            id: id.into(),
            rating,
        }
    }

    pub fn score(id: impl Into<String>, score: i64) -> Self {
        Self::new(id, RatingValue::Score(score))
    }

    pub fn deferred(id: impl Into<String>) -> Self {
        Self::new(id, RatingValue::Deferred)
    }

    pub fn failed(id: impl Into<String>, code: FailureCode) -> Self {
        Self::new(id, RatingValue::Failed(code))
    }
}
