//! Core job types and retry policy.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Claim priority. Higher priorities are claimed first regardless of age.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    Low,
    #[default]
    Normal,
    High,
}

impl JobPriority {
    /// Numeric rank, higher claims first.
    pub fn rank(&self) -> u8 {
        match self {
            JobPriority::Low => 0,
            JobPriority::Normal => 1,
            JobPriority::High => 2,
        }
    }
}

/// Job execution status.
///
/// There is no dead-letter state and no cancellation: a job that runs out of
/// attempts is marked [`Exhausted`](JobStatus::Exhausted) and stays in the
/// store for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Queued, waiting to be picked up.
    Pending,
    /// Currently being executed.
    Running,
    /// Completed successfully.
    Completed,
    /// Failed, scheduled for retry with backoff.
    Failed { error: String, attempt: u32 },
    /// Out of attempts; terminal.
    Exhausted { error: String, attempts: u32 },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Exhausted { .. })
    }
}

/// Retry policy: exponential backoff between a base and a cap.
///
/// `delay = base * 2^(attempt - 1)`, capped at `max_delay`. The defaults
/// match the queue's contract: 3 attempts, 2 s base, 30 s cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (first run included).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Cap applied to the exponential growth.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Fixed delay between attempts (base == cap).
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            max_delay: delay,
        }
    }

    /// Single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Backoff delay before retrying after `attempt` failures (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let shift = (attempt - 1).min(31);
        let delay = self
            .base_delay
            .checked_mul(1u32 << shift)
            .unwrap_or(self.max_delay);
        delay.min(self.max_delay)
    }

    /// Whether another attempt is allowed after `attempt` runs.
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// A queued unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Handler routing key (e.g. `"process-order"`).
    pub kind: String,
    /// JSON payload; at-least-once consumers must tolerate re-processing.
    pub payload: serde_json::Value,
    pub priority: JobPriority,
    pub status: JobStatus,
    pub retry_policy: RetryPolicy,
    /// Attempts started so far.
    pub attempt: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Earliest time the job may (re)run; `None` means immediately.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Error from the most recent failed attempt.
    pub last_error: Option<String>,
}

impl Job {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            kind: kind.into(),
            payload,
            priority: JobPriority::Normal,
            status: JobStatus::Pending,
            retry_policy: RetryPolicy::default(),
            attempt: 0,
            created_at: now,
            updated_at: now,
            scheduled_at: None,
            last_error: None,
        }
    }

    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Delay the first run.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.scheduled_at =
            Some(Utc::now() + chrono::Duration::from_std(delay).unwrap_or_default());
        self
    }

    /// Whether the job may run now.
    pub fn is_ready(&self) -> bool {
        match self.scheduled_at {
            Some(at) => Utc::now() >= at,
            None => true,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = JobStatus::Running;
        self.attempt += 1;
        self.updated_at = Utc::now();
    }

    pub fn mark_completed(&mut self) {
        self.status = JobStatus::Completed;
        self.updated_at = Utc::now();
    }

    /// Record a failure: schedules a retry with backoff, or exhausts the job
    /// when attempts have run out.
    pub fn mark_failed(&mut self, error: String) {
        let now = Utc::now();
        self.updated_at = now;
        self.last_error = Some(error.clone());

        if self.retry_policy.allows_retry(self.attempt) {
            let delay = self.retry_policy.delay_for_attempt(self.attempt);
            self.scheduled_at = Some(now + chrono::Duration::from_std(delay).unwrap_or_default());
            self.status = JobStatus::Failed {
                error,
                attempt: self.attempt,
            };
        } else {
            self.status = JobStatus::Exhausted {
                error,
                attempts: self.attempt,
            };
        }
    }
}

/// Result of one handler invocation.
#[derive(Debug)]
pub enum JobResult {
    /// Handler succeeded.
    Success,
    /// Handler failed; the retry policy decides what happens next.
    Failure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_cap() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(16));
        // Capped at 30s from here on.
        assert_eq!(policy.delay_for_attempt(5), Duration::from_secs(30));
        assert_eq!(policy.delay_for_attempt(12), Duration::from_secs(30));
    }

    #[test]
    fn fixed_policy_is_constant() {
        let policy = RetryPolicy::fixed(5, Duration::from_secs(7));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(7));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(7));
    }

    #[test]
    fn three_attempts_then_exhausted() {
        let mut job = Job::new("process-order", serde_json::json!({}));

        for expected_attempt in 1..=2u32 {
            job.mark_running();
            job.mark_failed(format!("boom {expected_attempt}"));
            assert!(
                matches!(job.status, JobStatus::Failed { attempt, .. } if attempt == expected_attempt)
            );
            assert!(job.scheduled_at.is_some());
        }

        job.mark_running();
        job.mark_failed("boom 3".to_string());
        assert!(matches!(
            job.status,
            JobStatus::Exhausted { attempts: 3, .. }
        ));
        assert!(job.status.is_terminal());
    }

    #[test]
    fn completed_job_is_terminal() {
        let mut job = Job::new("process-order", serde_json::json!({}));
        job.mark_running();
        job.mark_completed();
        assert!(job.status.is_terminal());
        assert!(job.last_error.is_none());
    }

    #[test]
    fn delayed_job_is_not_ready() {
        let job = Job::new("process-order", serde_json::json!({}))
            .delayed(Duration::from_secs(60));
        assert!(!job.is_ready());
    }

    #[test]
    fn priority_ordering() {
        assert!(JobPriority::High.rank() > JobPriority::Normal.rank());
        assert!(JobPriority::Normal.rank() > JobPriority::Low.rank());
    }
}
