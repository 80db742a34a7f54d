//! Redis-backed job store (durable, multi-process).
//!
//! ## Layout
//!
//! - **Hash** `dentiva:jobs` — job id → JSON-serialized [`Job`]
//! - **Sorted set** `dentiva:jobs:ready` — claimable job ids, scored by
//!   priority band plus ready time so higher priorities always sort first
//!
//! A claim is settled by `ZREM`: whichever worker removes the id from the
//! ready set owns the job. Workers that crash mid-run leave the job in
//! `running`; a redeploy can re-enqueue those by scanning the hash.

use std::sync::Arc;

use tracing::debug;

use crate::store::{JobStats, JobStore, JobStoreError};
use crate::types::{Job, JobId, JobStatus};

const DEFAULT_JOBS_KEY: &str = "dentiva:jobs";
const DEFAULT_READY_KEY: &str = "dentiva:jobs:ready";

/// Width of one priority band in the ready-set score, in milliseconds.
/// Large enough that ready times never cross into a neighboring band.
const PRIORITY_BAND_MS: f64 = 1.0e13;

/// How many ready candidates to inspect per claim attempt.
const CLAIM_BATCH: isize = 16;

#[derive(Debug, Clone)]
pub struct RedisJobStore {
    client: Arc<redis::Client>,
    jobs_key: String,
    ready_key: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RedisJobStoreError {
    #[error("redis connection error: {0}")]
    Connection(String),

    #[error("redis command error: {0}")]
    Command(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl From<RedisJobStoreError> for JobStoreError {
    fn from(e: RedisJobStoreError) -> Self {
        JobStoreError::Storage(e.to_string())
    }
}

impl RedisJobStore {
    /// Connect to Redis.
    ///
    /// `redis_url` is a standard connection URL, e.g. `redis://localhost:6379`.
    pub fn new(redis_url: impl AsRef<str>) -> Result<Self, RedisJobStoreError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| RedisJobStoreError::Connection(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            jobs_key: DEFAULT_JOBS_KEY.to_string(),
            ready_key: DEFAULT_READY_KEY.to_string(),
        })
    }

    pub fn with_key_prefix(mut self, prefix: &str) -> Self {
        self.jobs_key = format!("{prefix}:jobs");
        self.ready_key = format!("{prefix}:jobs:ready");
        self
    }

    fn connection(&self) -> Result<redis::Connection, RedisJobStoreError> {
        self.client
            .get_connection()
            .map_err(|e| RedisJobStoreError::Connection(e.to_string()))
    }

    /// Ready-set score: lower sorts first. Priority dominates, ready time
    /// breaks ties within a band.
    fn ready_score(job: &Job) -> f64 {
        let ready_ms = job
            .scheduled_at
            .unwrap_or(job.created_at)
            .timestamp_millis() as f64;
        let band = (2 - job.priority.rank()) as f64;
        band * PRIORITY_BAND_MS + ready_ms
    }

    fn save(
        &self,
        conn: &mut redis::Connection,
        job: &Job,
    ) -> Result<(), RedisJobStoreError> {
        let payload = serde_json::to_string(job)
            .map_err(|e| RedisJobStoreError::Serialization(e.to_string()))?;

        let _: u64 = redis::cmd("HSET")
            .arg(&self.jobs_key)
            .arg(job.id.to_string())
            .arg(&payload)
            .query(conn)
            .map_err(|e| RedisJobStoreError::Command(format!("HSET failed: {e}")))?;

        Ok(())
    }

    fn load(
        &self,
        conn: &mut redis::Connection,
        job_id: JobId,
    ) -> Result<Option<Job>, RedisJobStoreError> {
        let payload: Option<String> = redis::cmd("HGET")
            .arg(&self.jobs_key)
            .arg(job_id.to_string())
            .query(conn)
            .map_err(|e| RedisJobStoreError::Command(format!("HGET failed: {e}")))?;

        match payload {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| RedisJobStoreError::Deserialization(e.to_string())),
            None => Ok(None),
        }
    }

    fn mark_ready(
        &self,
        conn: &mut redis::Connection,
        job: &Job,
    ) -> Result<(), RedisJobStoreError> {
        let _: u64 = redis::cmd("ZADD")
            .arg(&self.ready_key)
            .arg(Self::ready_score(job))
            .arg(job.id.to_string())
            .query(conn)
            .map_err(|e| RedisJobStoreError::Command(format!("ZADD failed: {e}")))?;

        Ok(())
    }

    /// Remove a job id from the ready set. Returns true when this caller
    /// performed the removal, which is what settles a contested claim.
    fn take_from_ready(
        &self,
        conn: &mut redis::Connection,
        id: &str,
    ) -> Result<bool, RedisJobStoreError> {
        let removed: u64 = redis::cmd("ZREM")
            .arg(&self.ready_key)
            .arg(id)
            .query(conn)
            .map_err(|e| RedisJobStoreError::Command(format!("ZREM failed: {e}")))?;

        Ok(removed == 1)
    }
}

impl JobStore for RedisJobStore {
    fn enqueue(&self, job: Job) -> Result<JobId, JobStoreError> {
        let mut conn = self.connection()?;

        let exists: bool = redis::cmd("HEXISTS")
            .arg(&self.jobs_key)
            .arg(job.id.to_string())
            .query(&mut conn)
            .map_err(|e| RedisJobStoreError::Command(format!("HEXISTS failed: {e}")))?;
        if exists {
            return Err(JobStoreError::AlreadyExists(job.id));
        }

        self.save(&mut conn, &job)?;
        self.mark_ready(&mut conn, &job)?;

        debug!(job_id = %job.id, kind = %job.kind, "job enqueued to redis");
        Ok(job.id)
    }

    fn get(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError> {
        let mut conn = self.connection()?;
        Ok(self.load(&mut conn, job_id)?)
    }

    fn update(&self, job: &Job) -> Result<(), JobStoreError> {
        let mut conn = self.connection()?;

        if self.load(&mut conn, job.id)?.is_none() {
            return Err(JobStoreError::NotFound(job.id));
        }

        self.save(&mut conn, job)?;

        // Retryable failures go back on the ready set with their backoff
        // time; terminal and running jobs stay off it.
        match &job.status {
            JobStatus::Pending | JobStatus::Failed { .. } => {
                self.mark_ready(&mut conn, job)?;
            }
            JobStatus::Running | JobStatus::Completed | JobStatus::Exhausted { .. } => {
                self.take_from_ready(&mut conn, &job.id.to_string())?;
            }
        }

        Ok(())
    }

    fn claim_next(&self) -> Result<Option<Job>, JobStoreError> {
        let mut conn = self.connection()?;

        let candidates: Vec<String> = redis::cmd("ZRANGE")
            .arg(&self.ready_key)
            .arg(0)
            .arg(CLAIM_BATCH - 1)
            .query(&mut conn)
            .map_err(|e| RedisJobStoreError::Command(format!("ZRANGE failed: {e}")))?;

        for id in candidates {
            // Whoever removes the id owns the job.
            if !self.take_from_ready(&mut conn, &id)? {
                continue;
            }

            let Ok(uuid) = id.parse::<uuid::Uuid>() else {
                continue;
            };
            let Some(mut job) = self.load(&mut conn, JobId::from_uuid(uuid))? else {
                continue;
            };

            // Backoff not elapsed yet, put it back and keep scanning.
            if !job.is_ready() {
                self.mark_ready(&mut conn, &job)?;
                continue;
            }

            job.mark_running();
            self.save(&mut conn, &job)?;
            debug!(job_id = %job.id, attempt = job.attempt, "job claimed from redis");
            return Ok(Some(job));
        }

        Ok(None)
    }

    fn stats(&self) -> Result<JobStats, JobStoreError> {
        let mut conn = self.connection()?;

        let payloads: Vec<String> = redis::cmd("HVALS")
            .arg(&self.jobs_key)
            .query(&mut conn)
            .map_err(|e| RedisJobStoreError::Command(format!("HVALS failed: {e}")))?;

        let mut stats = JobStats::default();
        for json in payloads {
            let job: Job = serde_json::from_str(&json)
                .map_err(|e| RedisJobStoreError::Deserialization(e.to_string()))?;
            match job.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed { .. } => stats.failed += 1,
                JobStatus::Exhausted { .. } => stats.exhausted += 1,
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobPriority;

    #[test]
    fn priority_bands_dominate_ready_time() {
        let old_normal = Job::new("process-order", serde_json::json!({}));
        let mut new_high = Job::new("process-order", serde_json::json!({}))
            .with_priority(JobPriority::High);
        new_high.created_at = old_normal.created_at + chrono::Duration::hours(1);

        assert!(RedisJobStore::ready_score(&new_high) < RedisJobStore::ready_score(&old_normal));
    }

    #[test]
    fn within_a_band_older_jobs_score_lower() {
        let first = Job::new("process-order", serde_json::json!({}));
        let mut second = Job::new("process-order", serde_json::json!({}));
        second.created_at = first.created_at + chrono::Duration::seconds(5);

        assert!(RedisJobStore::ready_score(&first) < RedisJobStore::ready_score(&second));
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(RedisJobStore::new("not-a-url").is_err());
    }
}
