//! Remembered scores keyed by post id.
//!
//! Posts that already have a valid score are answered from here instead of
//! going back to the provider. Only scores that display as a rank are kept.

use moka::sync::Cache;

use crate::domain::{RatingResult, RatingValue};

/// Default number of remembered scores
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Bounded, thread-safe score cache
#[derive(Clone)]
pub struct ScoreCache {
    capacity: usize,
    inner: Cache<String, i64>,
}

impl Default for ScoreCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ScoreCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Cache::builder().max_capacity(capacity as u64).build(),
        }
    }

    pub fn get(&self, id: &str) -> Option<i64> {
        self.inner.get(id)
    }

    /// Number of stored scores, after moka's pending maintenance has run
    pub fn len(&self) -> usize {
        self.inner.run_pending_tasks();
        self.inner.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Learn from a delivered result
    pub fn record(&self, result: &RatingResult) {
        match result.rating {
            RatingValue::Failed(_) => {
                self.inner.invalidate(result.id.as_str());
                tracing::trace!(id = %result.id, "Score cache REMOVE");
            }
            rating => match rating.rank() {
                Some(rank) if self.capacity > 0 => self.inner.insert(result.id.clone(), rank),
                _ => {}
            },
        }
    }

    /// Forget everything, returning how many scores were dropped
    pub fn clear(&self) -> usize {
        let count = self.len();
        self.inner.invalidate_all();
        self.inner.run_pending_tasks();
        tracing::info!(count, "Score cache cleared");
        count
    }
}

impl std::fmt::Debug for ScoreCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreCache")
            .field("capacity", &self.capacity)
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}
