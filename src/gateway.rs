//! Dispatch gateway between consumers and the batch scheduler.
//!
//! Consumers `connect` to get a ratings channel, `submit` work tagged with
//! their id, and receive `{id, rating}` lists as batches complete. A consumer
//! that went away (receiver dropped) is forgotten; its ratings are discarded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

use crate::cache::{DEFAULT_CACHE_CAPACITY, ScoreCache};
use crate::domain::{ConsumerId, RatingResult, WorkItem};
use crate::error::Result;
use crate::rating::{RatingConfig, RatingProvider};
use crate::scheduler::{BatchScheduler, RatingSink, SchedulerSettings, SchedulerStatus};
use crate::settings::ConfigStore;

/// Options for building a gateway
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub scheduler: SchedulerSettings,
    /// Score cache capacity; `None` disables the cache
    pub cache_capacity: Option<usize>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            scheduler: SchedulerSettings::default(),
            cache_capacity: Some(DEFAULT_CACHE_CAPACITY),
        }
    }
}

impl GatewayOptions {
    pub fn without_cache(mut self) -> Self {
        self.cache_capacity = None;
        self
    }

    pub fn with_scheduler(mut self, settings: SchedulerSettings) -> Self {
        self.scheduler = settings;
        self
    }
}

/// A connected consumer: its id and the channel its ratings arrive on
#[derive(Debug)]
pub struct Connection {
    pub id: ConsumerId,
    pub ratings: mpsc::UnboundedReceiver<Vec<RatingResult>>,
}

struct ConsumerRegistry {
    consumers: Mutex<HashMap<ConsumerId, mpsc::UnboundedSender<Vec<RatingResult>>>>,
    cache: Option<ScoreCache>,
}

impl ConsumerRegistry {
    fn consumers(&self) -> MutexGuard<'_, HashMap<ConsumerId, mpsc::UnboundedSender<Vec<RatingResult>>>> {
        self.consumers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(&self, consumer: ConsumerId, results: Vec<RatingResult>) {
        let mut consumers = self.consumers();
        match consumers.get(&consumer) {
            Some(tx) => {
                if tx.send(results).is_err() {
                    debug!(consumer = %consumer, "Consumer disconnected, dropping ratings");
                    consumers.remove(&consumer);
                }
            }
            None => debug!(consumer = %consumer, count = results.len(), "No such consumer, dropping ratings"),
        }
    }
}

impl RatingSink for ConsumerRegistry {
    fn deliver(&self, consumer: ConsumerId, results: Vec<RatingResult>) {
        if let Some(cache) = &self.cache {
            for result in &results {
                cache.record(result);
            }
        }
        self.send(consumer, results);
    }
}

/// Front door of the rating pipeline
pub struct DispatchGateway {
    scheduler: BatchScheduler,
    config: ConfigStore,
    registry: Arc<ConsumerRegistry>,
    next_consumer: AtomicU64,
}

impl DispatchGateway {
    /// Build a gateway; must be called from within a tokio runtime
    pub fn new(provider: Arc<dyn RatingProvider>, config: ConfigStore, options: GatewayOptions) -> Result<Self> {
        let registry = Arc::new(ConsumerRegistry {
            consumers: Mutex::new(HashMap::new()),
            cache: options.cache_capacity.map(ScoreCache::new),
        });
        let scheduler = BatchScheduler::new(provider, config.clone(), registry.clone(), options.scheduler)?;

        Ok(Self {
            scheduler,
            config,
            registry,
            next_consumer: AtomicU64::new(1),
        })
    }

    /// Register a consumer and return the channel its ratings arrive on
    pub fn connect(&self) -> Connection {
        let id = ConsumerId(self.next_consumer.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.registry.consumers().insert(id, tx);
        debug!(consumer = %id, "Consumer connected");
        Connection { id, ratings: rx }
    }

    pub fn disconnect(&self, consumer: ConsumerId) {
        self.registry.consumers().remove(&consumer);
    }

    /// Submit work for `consumer`. Returns how many items were accepted:
    /// answered from the cache or queued. Nothing is accepted while paused.
    pub fn submit(&self, consumer: ConsumerId, items: Vec<WorkItem>) -> usize {
        if self.scheduler.is_paused() {
            debug!(consumer = %consumer, dropped = items.len(), "Paused, dropping submission");
            return 0;
        }

        let (cached, fresh): (Vec<RatingResult>, Vec<WorkItem>) = match &self.registry.cache {
            Some(cache) => {
                let mut cached = Vec::new();
                let mut fresh = Vec::new();
                for item in items {
                    match cache.get(&item.id) {
                        Some(score) => cached.push(RatingResult::score(item.id, score)),
                        None => fresh.push(item),
                    }
                }
                (cached, fresh)
            }
            None => (Vec::new(), items),
        };

        let answered = cached.len();
        if answered > 0 {
            debug!(consumer = %consumer, count = answered, "Answered from score cache");
            self.registry.send(consumer, cached);
        }

        answered + self.scheduler.enqueue(consumer, fresh)
    }

    pub fn set_paused(&self, paused: bool) {
        self.scheduler.set_paused(paused);
    }

    /// Replace credential, model and criteria together, then resume any work
    /// that was waiting for a credential. Never un-pauses.
    pub fn config_update(&self, config: RatingConfig) {
        self.config.replace(config);
        self.scheduler.drain();
    }

    /// Forget all cached scores
    pub fn clear_cache(&self) -> usize {
        self.registry.cache.as_ref().map(ScoreCache::clear).unwrap_or(0)
    }

    pub fn status(&self) -> SchedulerStatus {
        self.scheduler.status()
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }
}
