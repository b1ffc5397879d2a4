//! Batch scheduler for rating requests.
//!
//! This module provides:
//! - **SchedulerState**: the pending FIFO, the retry hold, and the
//!   processing/paused flags, plus batch composition and outcome application.
//! - **BatchScheduler**: the single-flight work loop that drives a
//!   RatingProvider and re-queues work after quota exhaustion.
//!
//! # Architecture
//!
//! 1. `enqueue` appends to the pending queue and calls `drain`
//! 2. `drain` starts one worker task unless a batch is already in flight
//! 3. The worker takes the retry hold plus pending items (at most 10),
//!    calls the provider, delivers results, and repeats while work remains
//! 4. Quota exhaustion parks the batch in the retry hold and arms a one-shot
//!    retry timer that calls `drain` again after the retry delay
//!
//! # Example
//!
//! ```ignore
//! use postrank::scheduler::{BatchScheduler, SchedulerSettings};
//!
//! let scheduler = BatchScheduler::new(provider, config_store, sink, SchedulerSettings::default())?;
//! scheduler.enqueue(consumer, items);
//! ```

mod batch;
mod state;

pub use batch::{BatchScheduler, RatingSink, SchedulerSettings, SchedulerStatus};
pub use state::{Applied, MAX_BATCH_SIZE, QueuedItem, SchedulerState};
