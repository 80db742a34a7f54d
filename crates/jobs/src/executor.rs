//! Worker pool executing jobs with retry and backoff.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::store::JobStore;
use crate::types::{Job, JobResult, JobStatus};

/// Job handler function type.
pub type JobHandler = Box<dyn Fn(&Job) -> JobResult + Send + Sync>;

/// Executor configuration.
#[derive(Debug, Clone)]
pub struct JobExecutorConfig {
    /// How often an idle worker polls for new jobs.
    pub poll_interval: Duration,
    /// Worker threads pulling from the shared store (2-3 by environment).
    pub workers: usize,
    /// Name for logging.
    pub name: String,
}

impl Default for JobExecutorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            workers: 2,
            name: "job-executor".to_string(),
        }
    }
}

impl JobExecutorConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Handle to control a running executor pool.
#[derive(Debug)]
pub struct JobExecutorHandle {
    shutdown: Arc<AtomicBool>,
    joins: Vec<thread::JoinHandle<()>>,
    stats: Arc<Mutex<ExecutorStats>>,
}

impl JobExecutorHandle {
    /// Request graceful shutdown and join all workers.
    pub fn shutdown(mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        for j in self.joins.drain(..) {
            let _ = j.join();
        }
    }

    /// Snapshot of executor counters.
    pub fn stats(&self) -> ExecutorStats {
        self.stats.lock().unwrap().clone()
    }
}

/// Executor runtime statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ExecutorStats {
    pub jobs_processed: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub jobs_exhausted: u64,
    pub uptime_secs: u64,
}

/// Background job executor.
///
/// Registers handlers by job kind, then spawns a bounded pool of worker
/// threads claiming jobs from the shared store. Failed jobs are retried by
/// the store's backoff scheduling until exhausted.
pub struct JobExecutor<S: JobStore> {
    store: S,
    handlers: HashMap<String, JobHandler>,
}

impl<S: JobStore + Clone + Send + 'static> JobExecutor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a job kind.
    pub fn register_handler<F>(&mut self, kind: impl Into<String>, handler: F)
    where
        F: Fn(&Job) -> JobResult + Send + Sync + 'static,
    {
        self.handlers.insert(kind.into(), Box::new(handler));
    }

    /// Spawn the worker pool.
    pub fn spawn(self, config: JobExecutorConfig) -> JobExecutorHandle {
        let shutdown = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(Mutex::new(ExecutorStats::default()));
        let handlers = Arc::new(self.handlers);
        let store = self.store;

        info!(executor = %config.name, workers = config.workers, "job executor starting");

        let joins = (0..config.workers)
            .map(|i| {
                let name = format!("{}-{}", config.name, i);
                let store = store.clone();
                let handlers = handlers.clone();
                let shutdown = shutdown.clone();
                let stats = stats.clone();
                let poll_interval = config.poll_interval;

                thread::Builder::new()
                    .name(name.clone())
                    .spawn(move || {
                        worker_loop(&name, store, &handlers, &shutdown, &stats, poll_interval);
                    })
                    .expect("failed to spawn job worker thread")
            })
            .collect();

        JobExecutorHandle {
            shutdown,
            joins,
            stats,
        }
    }

    /// Execute a single claimed job (used by tests and the inline fallback).
    pub fn execute_one(&self, job: &mut Job) -> Result<(), String> {
        execute_claimed(&self.store, &self.handlers, job)
    }
}

fn worker_loop<S: JobStore>(
    name: &str,
    store: S,
    handlers: &HashMap<String, JobHandler>,
    shutdown: &AtomicBool,
    stats: &Mutex<ExecutorStats>,
    poll_interval: Duration,
) {
    info!(worker = name, "job worker started");
    let start_time = Instant::now();

    while !shutdown.load(Ordering::SeqCst) {
        {
            let mut s = stats.lock().unwrap();
            s.uptime_secs = start_time.elapsed().as_secs();
        }

        match store.claim_next() {
            Ok(Some(mut job)) => {
                debug!(worker = name, job_id = %job.id, kind = %job.kind, "claimed job");

                let result = execute_claimed(&store, handlers, &mut job);

                let mut s = stats.lock().unwrap();
                s.jobs_processed += 1;
                match result {
                    Ok(()) => s.jobs_succeeded += 1,
                    Err(_) => {
                        s.jobs_failed += 1;
                        if matches!(job.status, JobStatus::Exhausted { .. }) {
                            s.jobs_exhausted += 1;
                        }
                    }
                }
            }
            Ok(None) => thread::sleep(poll_interval),
            Err(e) => {
                error!(worker = name, error = %e, "failed to claim job");
                thread::sleep(poll_interval);
            }
        }
    }

    info!(worker = name, "job worker stopped");
}

fn execute_claimed<S: JobStore>(
    store: &S,
    handlers: &HashMap<String, JobHandler>,
    job: &mut Job,
) -> Result<(), String> {
    let Some(handler) = handlers.get(&job.kind) else {
        let error = format!("no handler for job kind: {}", job.kind);
        warn!(job_id = %job.id, kind = %job.kind, "no handler registered");
        job.mark_failed(error.clone());
        store.update(job).ok();
        return Err(error);
    };

    match handler(job) {
        JobResult::Success => {
            job.mark_completed();
            store.update(job).map_err(|e| e.to_string())?;
            debug!(job_id = %job.id, "job completed");
            Ok(())
        }
        JobResult::Failure(error) => {
            job.mark_failed(error.clone());
            store.update(job).map_err(|e| e.to_string())?;

            if matches!(job.status, JobStatus::Exhausted { .. }) {
                warn!(job_id = %job.id, error = %error, attempts = job.attempt, "job exhausted retries");
            } else {
                debug!(job_id = %job.id, error = %error, attempt = job.attempt, "job failed, will retry");
            }

            Err(error)
        }
    }
}
