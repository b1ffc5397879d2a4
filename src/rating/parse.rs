//! Parsing of the model's comma-separated rating line.

use crate::domain::{FailureCode, RatingValue};

/// Parse `text` into exactly `expected` rating values.
///
/// Each comma-separated segment is trimmed and parsed as an integer. A segment
/// that is not an integer becomes `UnparsableRating` for that item only.
/// Integers are passed through verbatim, including values outside 1-10.
/// Missing trailing segments are padded with `UnparsableRating`; surplus
/// segments are dropped.
pub fn parse_ratings(text: &str, expected: usize) -> Vec<RatingValue> {
    let mut values: Vec<RatingValue> = text.split(',').map(parse_segment).collect();

    if values.len() > expected {
        tracing::warn!(expected, got = values.len(), "Provider returned surplus ratings, ignoring extras");
        values.truncate(expected);
    } else if values.len() < expected {
        tracing::warn!(expected, got = values.len(), "Provider returned too few ratings, padding");
        values.resize(expected, RatingValue::Failed(FailureCode::UnparsableRating));
    }

    values
}

fn parse_segment(segment: &str) -> RatingValue {
    match segment.trim().parse::<i64>() {
        Ok(n) => RatingValue::Score(n),
        Err(_) => RatingValue::Failed(FailureCode::UnparsableRating),
    }
}
