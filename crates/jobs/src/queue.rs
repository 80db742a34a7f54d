//! Order queue: enqueue with a timeout race and a synchronous fallback.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::store::{JobStore, JobStoreError};
use crate::types::{Job, JobId, JobPriority, RetryPolicy};

/// Inline processor invoked when the backing store is unavailable or slow.
pub type FallbackProcessor =
    Arc<dyn Fn(&serde_json::Value) -> Result<(), String> + Send + Sync>;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct OrderQueueConfig {
    /// Handler routing key stamped on every enqueued job.
    pub job_kind: String,
    /// How long to wait for the store before falling back to inline
    /// processing.
    pub enqueue_timeout: Duration,
    pub priority: JobPriority,
    pub retry_policy: RetryPolicy,
}

impl Default for OrderQueueConfig {
    fn default() -> Self {
        Self {
            job_kind: "process-order".to_string(),
            enqueue_timeout: Duration::from_secs(5),
            priority: JobPriority::Normal,
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// How an order submission was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The job was durably queued for background execution.
    Queued(JobId),
    /// The store was absent, slow, or failing; the order was processed
    /// inline on the caller's thread instead.
    RanInline,
}

/// Queue error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueueError {
    #[error("inline processing failed: {0}")]
    Inline(String),
    #[error(transparent)]
    Store(#[from] JobStoreError),
}

/// Front door for order submissions.
///
/// `submit` races the store enqueue against a timeout. When no store is
/// configured, or the enqueue does not come back in time, the order is
/// processed synchronously through the fallback so that a degraded queue
/// never drops orders. The cost of the fallback path is latency on the
/// caller, not data loss.
#[derive(Clone)]
pub struct OrderQueue {
    store: Option<Arc<dyn JobStore>>,
    fallback: FallbackProcessor,
    config: OrderQueueConfig,
}

impl OrderQueue {
    pub fn new(
        store: Option<Arc<dyn JobStore>>,
        fallback: FallbackProcessor,
        config: OrderQueueConfig,
    ) -> Self {
        Self {
            store,
            fallback,
            config,
        }
    }

    /// Submit an order payload.
    ///
    /// Exactly one of the two paths runs to completion from the caller's
    /// perspective: a durable enqueue, or inline fallback processing. A
    /// timed-out enqueue that later lands in the store can cause the order
    /// to be handled twice; downstream consumers are expected to tolerate
    /// at-least-once delivery.
    pub fn submit(&self, payload: serde_json::Value) -> Result<EnqueueOutcome, QueueError> {
        let Some(store) = self.store.clone() else {
            info!("no job store configured, processing order inline");
            return self.run_inline(&payload);
        };

        let job = Job::new(self.config.job_kind.clone(), payload.clone())
            .with_priority(self.config.priority)
            .with_retry_policy(self.config.retry_policy);
        let job_id = job.id;

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(store.enqueue(job));
        });

        match rx.recv_timeout(self.config.enqueue_timeout) {
            Ok(Ok(id)) => {
                info!(job_id = %id, "order queued");
                Ok(EnqueueOutcome::Queued(id))
            }
            Ok(Err(e)) => {
                warn!(error = %e, "enqueue failed, processing order inline");
                self.run_inline(&payload)
            }
            Err(_) => {
                warn!(job_id = %job_id, timeout = ?self.config.enqueue_timeout, "enqueue timed out, processing order inline");
                self.run_inline(&payload)
            }
        }
    }

    /// Look up a previously queued job.
    pub fn check_status(&self, job_id: JobId) -> Result<Option<Job>, QueueError> {
        match &self.store {
            Some(store) => Ok(store.get(job_id)?),
            None => Ok(None),
        }
    }

    /// Counts by status, when a store is configured.
    pub fn stats(&self) -> Result<Option<crate::store::JobStats>, QueueError> {
        match &self.store {
            Some(store) => Ok(Some(store.stats()?)),
            None => Ok(None),
        }
    }

    fn run_inline(&self, payload: &serde_json::Value) -> Result<EnqueueOutcome, QueueError> {
        (self.fallback)(payload)
            .map(|()| EnqueueOutcome::RanInline)
            .map_err(QueueError::Inline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryJobStore;
    use crate::types::JobStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_fallback() -> (FallbackProcessor, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let fallback: FallbackProcessor = Arc::new(move |_payload| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (fallback, count)
    }

    #[test]
    fn submit_queues_when_store_is_healthy() {
        let store = InMemoryJobStore::arc();
        let (fallback, inline_count) = counting_fallback();
        let queue = OrderQueue::new(
            Some(store.clone()),
            fallback,
            OrderQueueConfig::default(),
        );

        let outcome = queue
            .submit(serde_json::json!({"customer_id": "CUST-1"}))
            .unwrap();

        let EnqueueOutcome::Queued(job_id) = outcome else {
            panic!("expected a queued outcome");
        };
        assert_eq!(inline_count.load(Ordering::SeqCst), 0);

        let job = queue.check_status(job_id).unwrap().unwrap();
        assert_eq!(job.kind, "process-order");
        assert!(matches!(job.status, JobStatus::Pending));
    }

    #[test]
    fn submit_runs_inline_without_a_store() {
        let (fallback, inline_count) = counting_fallback();
        let queue = OrderQueue::new(None, fallback, OrderQueueConfig::default());

        let outcome = queue.submit(serde_json::json!({})).unwrap();
        assert_eq!(outcome, EnqueueOutcome::RanInline);
        assert_eq!(inline_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn slow_store_falls_back_inline() {
        struct SlowStore;
        impl JobStore for SlowStore {
            fn enqueue(&self, job: Job) -> Result<JobId, JobStoreError> {
                thread::sleep(Duration::from_millis(300));
                Ok(job.id)
            }
            fn get(&self, _job_id: JobId) -> Result<Option<Job>, JobStoreError> {
                Ok(None)
            }
            fn update(&self, _job: &Job) -> Result<(), JobStoreError> {
                Ok(())
            }
            fn claim_next(&self) -> Result<Option<Job>, JobStoreError> {
                Ok(None)
            }
            fn stats(&self) -> Result<crate::store::JobStats, JobStoreError> {
                Ok(Default::default())
            }
        }

        let (fallback, inline_count) = counting_fallback();
        let config = OrderQueueConfig {
            enqueue_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let queue = OrderQueue::new(Some(Arc::new(SlowStore)), fallback, config);

        let outcome = queue.submit(serde_json::json!({})).unwrap();
        assert_eq!(outcome, EnqueueOutcome::RanInline);
        assert_eq!(inline_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_store_falls_back_inline() {
        struct BrokenStore;
        impl JobStore for BrokenStore {
            fn enqueue(&self, _job: Job) -> Result<JobId, JobStoreError> {
                Err(JobStoreError::Storage("connection refused".to_string()))
            }
            fn get(&self, _job_id: JobId) -> Result<Option<Job>, JobStoreError> {
                Ok(None)
            }
            fn update(&self, _job: &Job) -> Result<(), JobStoreError> {
                Ok(())
            }
            fn claim_next(&self) -> Result<Option<Job>, JobStoreError> {
                Ok(None)
            }
            fn stats(&self) -> Result<crate::store::JobStats, JobStoreError> {
                Ok(Default::default())
            }
        }

        let (fallback, inline_count) = counting_fallback();
        let queue = OrderQueue::new(
            Some(Arc::new(BrokenStore)),
            fallback,
            OrderQueueConfig::default(),
        );

        let outcome = queue.submit(serde_json::json!({})).unwrap();
        assert_eq!(outcome, EnqueueOutcome::RanInline);
        assert_eq!(inline_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn inline_failure_surfaces_as_error() {
        let fallback: FallbackProcessor =
            Arc::new(|_payload| Err("erp rejected the order".to_string()));
        let queue = OrderQueue::new(None, fallback, OrderQueueConfig::default());

        assert!(matches!(
            queue.submit(serde_json::json!({})),
            Err(QueueError::Inline(_))
        ));
    }
}
