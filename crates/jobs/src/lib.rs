//! `dentiva-jobs` — durable work queue with retry and backoff.
//!
//! ## Design
//!
//! - Jobs carry a JSON payload and a kind string used for handler routing
//! - Claims are ordered by priority, then FIFO
//! - Retry policy: exponential backoff (2 s → 30 s by default), at most 3
//!   attempts, then the job is marked exhausted and stays visible — there is
//!   deliberately no dead-letter queue and no cancellation
//! - At-least-once: a worker crash between side effect and status update
//!   means the job runs again; no idempotency key is derived from job
//!   content (known gap, see DESIGN.md)
//!
//! ## Components
//!
//! - [`Job`]/[`RetryPolicy`]: the queued unit of work and its retry rules
//! - [`JobStore`]: persistence (in-memory, or Redis behind the `redis`
//!   feature)
//! - [`JobExecutor`]: bounded pool of worker threads claiming from a shared
//!   store
//! - [`OrderQueue`]: enqueue wrapper racing a timeout, with synchronous
//!   fallback when the backing store is absent or slow

pub mod executor;
pub mod queue;
pub mod store;
pub mod types;

#[cfg(feature = "redis")]
pub mod redis_store;

pub use executor::{ExecutorStats, JobExecutor, JobExecutorConfig, JobExecutorHandle};
pub use queue::{EnqueueOutcome, FallbackProcessor, OrderQueue, OrderQueueConfig, QueueError};
pub use store::{InMemoryJobStore, JobStats, JobStore, JobStoreError};
pub use types::{Job, JobId, JobPriority, JobResult, JobStatus, RetryPolicy};

#[cfg(feature = "redis")]
pub use redis_store::{RedisJobStore, RedisJobStoreError};
