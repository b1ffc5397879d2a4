//! Batch scheduler driving the rating provider.
//!
//! At most one batch is in flight. `drain` never blocks and never queues a
//! second worker: if a batch is running, the scheduler is paused, there is no
//! work, or no credential is configured, it returns without doing anything.
//! The worker loops until one of those conditions holds or a quota wait is armed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{ConsumerId, FailureCode, RatingResult, WorkItem};
use crate::error::{RankerError, Result};
use crate::rating::{ClassifiedOutcome, RatingConfig, RatingProvider};
use crate::scheduler::state::{QueuedItem, SchedulerState};
use crate::settings::ConfigStore;

/// Receives rating results for the consumer that submitted the items
pub trait RatingSink: Send + Sync {
    fn deliver(&self, consumer: ConsumerId, results: Vec<RatingResult>);
}

/// Timing knobs for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Wait after quota exhaustion before the held batch is retried
    pub retry_delay: Duration,
    /// Upper bound on a single provider call
    pub call_timeout: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(5000),
            call_timeout: Duration::from_secs(60),
        }
    }
}

impl SchedulerSettings {
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

/// Point-in-time view of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub pending: usize,
    pub held: usize,
    pub processing: bool,
    pub paused: bool,
    pub retry_armed: bool,
}

struct RetryTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Shared {
    state: SchedulerState,
    retry_timer: Option<RetryTimer>,
    timer_generation: u64,
}

struct Inner {
    shared: Mutex<Shared>,
    provider: Arc<dyn RatingProvider>,
    config: ConfigStore,
    sink: Arc<dyn RatingSink>,
    settings: SchedulerSettings,
    runtime: Handle,
}

/// Single-flight batching scheduler. Clones share the same queues.
#[derive(Clone)]
pub struct BatchScheduler {
    inner: Arc<Inner>,
}

impl BatchScheduler {
    /// Build a scheduler bound to the current tokio runtime.
    ///
    /// Workers and retry timers are spawned on that runtime, so later calls
    /// to `enqueue` or `set_paused` may come from any thread.
    pub fn new(
        provider: Arc<dyn RatingProvider>,
        config: ConfigStore,
        sink: Arc<dyn RatingSink>,
        settings: SchedulerSettings,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| RankerError::Runtime(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                shared: Mutex::new(Shared {
                    state: SchedulerState::new(),
                    retry_timer: None,
                    timer_generation: 0,
                }),
                provider,
                config,
                sink,
                settings,
                runtime,
            }),
        })
    }

    /// Queue items for `consumer` and try to start a batch.
    ///
    /// Returns the number of accepted items; while paused nothing is accepted.
    pub fn enqueue(&self, consumer: ConsumerId, items: Vec<WorkItem>) -> usize {
        let accepted = {
            let mut shared = self.inner.lock();
            if shared.state.is_paused() {
                debug!(consumer = %consumer, dropped = items.len(), "Scheduler paused, dropping submitted items");
                return 0;
            }
            let count = items.len();
            shared
                .state
                .push_pending(items.into_iter().map(|item| QueuedItem::new(consumer, item)));
            count
        };

        self.inner.drain();
        accepted
    }

    /// Pause or resume. Resuming restarts draining; pausing keeps the queues
    /// and lets an in-flight batch finish.
    pub fn set_paused(&self, paused: bool) {
        let was_paused = self.inner.lock().state.set_paused(paused);
        info!(paused, "Scheduler pause state changed");

        if was_paused && !paused {
            self.inner.drain();
        }
    }

    /// Try to start processing. Returns true if a worker was started.
    pub fn drain(&self) -> bool {
        self.inner.drain()
    }

    pub fn is_paused(&self) -> bool {
        self.inner.lock().state.is_paused()
    }

    pub fn status(&self) -> SchedulerStatus {
        let shared = self.inner.lock();
        SchedulerStatus {
            pending: shared.state.pending_len(),
            held: shared.state.retry_hold_len(),
            processing: shared.state.is_processing(),
            paused: shared.state.is_paused(),
            retry_armed: shared.retry_timer.is_some(),
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn drain(self: &Arc<Self>) -> bool {
        {
            let mut shared = self.lock();
            if !shared.state.can_drain() {
                debug!(
                    processing = shared.state.is_processing(),
                    paused = shared.state.is_paused(),
                    "Drain skipped"
                );
                return false;
            }
            if !self.config.has_credential() {
                debug!("Drain skipped, no credential configured");
                return false;
            }
            shared.state.set_processing(true);
        }

        let inner = Arc::clone(self);
        self.runtime.spawn(async move { inner.run_worker().await });
        true
    }

    /// Process batches until there is nothing left to do.
    async fn run_worker(self: Arc<Self>) {
        let mut guard = ProcessingGuard {
            inner: &self,
            armed: true,
        };

        loop {
            let (batch, config) = {
                let mut shared = self.lock();
                let config = self.config.snapshot();
                if shared.state.is_paused() || !shared.state.has_work() || !config.has_credential() {
                    shared.state.set_processing(false);
                    guard.armed = false;
                    return;
                }
                (shared.state.take_batch(), config)
            };

            let items: Vec<WorkItem> = batch.iter().map(|q| q.item.clone()).collect();
            let batch_size = items.len();
            info!(batch_size, provider = self.provider.name(), "Dispatching rating batch");

            let outcome = self.call_provider(items, config).await;
            let applied = self.lock().state.apply(batch, &outcome);
            debug!(outcome = outcome.kind(), deliveries = applied.deliveries.len(), "Outcome applied");

            match &outcome {
                ClassifiedOutcome::Rated(_) => info!(batch_size, "Rating batch completed"),
                ClassifiedOutcome::QuotaExhausted => warn!(
                    batch_size,
                    delay_ms = self.settings.retry_delay.as_millis() as u64,
                    "Quota exhausted, holding batch for retry"
                ),
                ClassifiedOutcome::HardFailure(code) => {
                    warn!(batch_size, code = %code, "Rating batch failed")
                }
                ClassifiedOutcome::Unconfigured => warn!(batch_size, "No credential at call time"),
            }

            for (consumer, results) in applied.deliveries {
                self.sink.deliver(consumer, results);
            }

            if applied.retry {
                let mut shared = self.lock();
                shared.state.set_processing(false);
                guard.armed = false;
                self.arm_retry(&mut shared);
                return;
            }
        }
    }

    /// Run one provider call on its own task so a panic or a hang still
    /// yields an outcome for the batch.
    async fn call_provider(&self, items: Vec<WorkItem>, config: RatingConfig) -> ClassifiedOutcome {
        let provider = Arc::clone(&self.provider);
        let timeout = self.settings.call_timeout;
        let call = self
            .runtime
            .spawn(async move { tokio::time::timeout(timeout, provider.call(&items, &config)).await });

        match call.await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Rating call timed out");
                ClassifiedOutcome::HardFailure(FailureCode::TransportError)
            }
            Err(e) => {
                warn!(error = %e, "Rating call aborted");
                ClassifiedOutcome::HardFailure(FailureCode::TransportError)
            }
        }
    }

    /// Replace any pending retry timer with a fresh one
    fn arm_retry(self: &Arc<Self>, shared: &mut Shared) {
        if let Some(previous) = shared.retry_timer.take() {
            previous.handle.abort();
        }

        shared.timer_generation += 1;
        let generation = shared.timer_generation;
        let delay = self.settings.retry_delay;
        let inner = Arc::clone(self);

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut shared = inner.lock();
                if shared.retry_timer.as_ref().is_some_and(|t| t.generation == generation) {
                    shared.retry_timer = None;
                }
            }
            debug!(generation, "Retry timer fired");
            inner.drain();
        });

        shared.retry_timer = Some(RetryTimer { generation, handle });
    }
}

/// Clears the processing flag if the worker ends without doing so itself
/// (panic in the provider, task abort).
struct ProcessingGuard<'a> {
    inner: &'a Inner,
    armed: bool,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Rating worker ended abnormally, releasing processing flag");
            self.inner.lock().state.set_processing(false);
        }
    }
}
