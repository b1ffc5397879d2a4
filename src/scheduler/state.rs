//! Scheduler state and the pure parts of batch processing.
//!
//! Nothing here touches the network or the clock: the worker in `batch.rs`
//! composes a batch, awaits the provider, and hands the outcome back here.

use std::collections::VecDeque;

use crate::domain::{ConsumerId, FailureCode, RatingResult, RatingValue, WorkItem};
use crate::rating::ClassifiedOutcome;

/// Maximum number of items sent in one provider request
pub const MAX_BATCH_SIZE: usize = 10;

/// A work item together with the consumer that submitted it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedItem {
    pub consumer: ConsumerId,
    pub item: WorkItem,
}

impl QueuedItem {
    pub fn new(consumer: ConsumerId, item: WorkItem) -> Self {
        Self { consumer, item }
    }
}

/// What applying an outcome produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Results grouped per consumer, in first-seen order; batch order within a group
    pub deliveries: Vec<(ConsumerId, Vec<RatingResult>)>,
    /// True when the batch went back to the retry hold
    pub retry: bool,
}

/// Queues and flags owned by the scheduler
#[derive(Debug, Default)]
pub struct SchedulerState {
    pending: VecDeque<QueuedItem>,
    retry_hold: Vec<QueuedItem>,
    processing: bool,
    paused: bool,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append items to the pending queue in arrival order
    pub fn push_pending(&mut self, items: impl IntoIterator<Item = QueuedItem>) {
        self.pending.extend(items);
    }

    pub fn has_work(&self) -> bool {
        !self.pending.is_empty() || !self.retry_hold.is_empty()
    }

    /// True when a new batch may start (credential aside)
    pub fn can_drain(&self) -> bool {
        !self.processing && !self.paused && self.has_work()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn set_processing(&mut self, processing: bool) {
        self.processing = processing;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Set the paused flag, returning the previous value
    pub fn set_paused(&mut self, paused: bool) -> bool {
        std::mem::replace(&mut self.paused, paused)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn retry_hold_len(&self) -> usize {
        self.retry_hold.len()
    }

    /// Compose the next batch: the whole retry hold first, then pending items
    /// from the head of the queue up to the batch ceiling.
    pub fn take_batch(&mut self) -> Vec<QueuedItem> {
        let mut batch = std::mem::take(&mut self.retry_hold);
        let room = MAX_BATCH_SIZE.saturating_sub(batch.len());
        let take = room.min(self.pending.len());
        batch.extend(self.pending.drain(..take));
        batch
    }

    /// Apply a provider outcome to the batch it was produced for
    pub fn apply(&mut self, batch: Vec<QueuedItem>, outcome: &ClassifiedOutcome) -> Applied {
        match outcome {
            ClassifiedOutcome::Rated(values) => {
                let results = batch.iter().enumerate().map(|(i, queued)| {
                    let rating = values
                        .get(i)
                        .copied()
                        .unwrap_or(RatingValue::Failed(FailureCode::UnparsableRating));
                    (queued.consumer, RatingResult::new(queued.item.id.clone(), rating))
                });
                Applied {
                    deliveries: group_by_consumer(results),
                    retry: false,
                }
            }
            ClassifiedOutcome::QuotaExhausted => {
                let deliveries = group_by_consumer(
                    batch
                        .iter()
                        .map(|q| (q.consumer, RatingResult::deferred(q.item.id.clone()))),
                );
                // Held items go ahead of anything the retry hold already has
                let mut held = batch;
                held.append(&mut self.retry_hold);
                self.retry_hold = held;
                Applied {
                    deliveries,
                    retry: true,
                }
            }
            ClassifiedOutcome::HardFailure(code) => Applied {
                deliveries: group_by_consumer(
                    batch
                        .iter()
                        .map(|q| (q.consumer, RatingResult::failed(q.item.id.clone(), *code))),
                ),
                retry: false,
            },
            ClassifiedOutcome::Unconfigured => Applied {
                deliveries: group_by_consumer(
                    batch
                        .iter()
                        .map(|q| (q.consumer, RatingResult::deferred(q.item.id.clone()))),
                ),
                retry: false,
            },
        }
    }
}

fn group_by_consumer(
    results: impl IntoIterator<Item = (ConsumerId, RatingResult)>,
) -> Vec<(ConsumerId, Vec<RatingResult>)> {
    let mut groups: Vec<(ConsumerId, Vec<RatingResult>)> = Vec::new();
    for (consumer, result) in results {
        match groups.iter_mut().find(|(c, _)| *c == consumer) {
            Some((_, group)) => group.push(result),
            None => groups.push((consumer, vec![result])),
        }
    }
    groups
}
