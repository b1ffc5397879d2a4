//! Scripted rating provider for tests and dry runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{RatingValue, WorkItem};
use crate::rating::parse::parse_ratings;
use crate::rating::provider::{ClassifiedOutcome, RatingConfig, RatingProvider};

/// What the mock answers for one call
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Raw model text, parsed like a real provider would
    Text(String),
    /// Same score for every item in the batch
    Uniform(i64),
    /// A fixed classified outcome
    Outcome(ClassifiedOutcome),
    /// Never resolves
    Hang,
    /// Panics inside the call
    Panic,
}

/// Provider that replays scripted replies and records every batch it sees
pub struct MockProvider {
    replies: Mutex<VecDeque<MockReply>>,
    fallback: MockReply,
    delay: Duration,
    calls: Mutex<Vec<Vec<WorkItem>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockProvider {
    /// Replies are consumed in order; once exhausted the fallback is used
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: MockReply::Uniform(5),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_fallback(mut self, reply: MockReply) -> Self {
        self.fallback = reply;
        self
    }

    /// Simulated network latency per call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Batches received so far, in call order
    pub fn calls(&self) -> Vec<Vec<WorkItem>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Ids of each received batch, in call order
    pub fn call_ids(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .map(|batch| batch.into_iter().map(|item| item.id).collect())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Highest number of overlapping calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Decrements the in-flight count when a call ends, including when the
/// call future is dropped on timeout or unwinds.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RatingProvider for MockProvider {
    async fn call(&self, batch: &[WorkItem], config: &RatingConfig) -> ClassifiedOutcome {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(batch.to_vec());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        let reply = self.next_reply();

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if !config.has_credential() {
            ClassifiedOutcome::Unconfigured
        } else {
            match reply {
                MockReply::Text(text) => ClassifiedOutcome::Rated(parse_ratings(&text, batch.len())),
                MockReply::Uniform(score) => ClassifiedOutcome::Rated(vec![RatingValue::Score(score); batch.len()]),
                MockReply::Outcome(outcome) => outcome,
                MockReply::Hang => std::future::pending().await,
                MockReply::Panic => panic!("mock provider panicked"),
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
