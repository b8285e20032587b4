//! Bounded worker pool with caller-runs backpressure.
//!
//! Event handling runs on a fixed number of concurrent tasks. When every
//! slot is busy the submitting task runs the work itself instead of
//! queueing it: under overload the consumer degrades to synchronous
//! processing, which slows the bus hand-off rather than growing an
//! unbounded backlog.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Semaphore, TryAcquireError};
use tracing::debug;

use pylon_core::defaults;

/// Configuration for the ingest worker pool.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Maximum number of concurrently processed events.
    pub max_concurrent: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::INGEST_MAX_CONCURRENT,
        }
    }
}

impl PoolSettings {
    /// Create settings from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `INGEST_MAX_CONCURRENT` | `16` | Max concurrent event tasks |
    pub fn from_env() -> Self {
        let max_concurrent = std::env::var("INGEST_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::INGEST_MAX_CONCURRENT)
            .max(1);

        Self { max_concurrent }
    }

    /// Set the maximum concurrency.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }
}

/// Bounded pool for event-handling tasks.
pub struct IngestPool {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl IngestPool {
    /// Create a pool with the given settings.
    pub fn new(settings: PoolSettings) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(settings.max_concurrent)),
            max_concurrent: settings.max_concurrent,
        }
    }

    /// Submit a task to the pool.
    ///
    /// If a slot is free the task is spawned and this call returns
    /// immediately. When the pool is saturated the task runs to completion
    /// on the caller before this call returns (caller-runs backpressure;
    /// the task is never dropped).
    pub async fn submit<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => {
                tokio::spawn(async move {
                    task.await;
                    drop(permit);
                });
            }
            Err(TryAcquireError::NoPermits) => {
                debug!(
                    subsystem = "ingest",
                    component = "pool",
                    op = "submit",
                    max_concurrent = self.max_concurrent,
                    "Pool saturated, running task on caller"
                );
                task.await;
            }
            Err(TryAcquireError::Closed) => {
                // The semaphore is never closed; run inline if it ever is.
                task.await;
            }
        }
    }

    /// Number of free slots.
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Configured maximum concurrency.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}
