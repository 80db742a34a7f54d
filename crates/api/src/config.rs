//! Environment-driven configuration.

use std::time::Duration;

use tracing::warn;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Listen address, `DENTIVA_ADDR` (default `0.0.0.0:8080`).
    pub addr: String,
    /// HS256 signing secret, `JWT_SECRET`.
    pub jwt_secret: String,
    /// Redis connection URL for the durable job store, `REDIS_URL`.
    /// Absent means in-memory jobs (dev) or inline fallback.
    pub redis_url: Option<String>,
    /// Master switch for the job-queue path, `USE_REDIS`. When off, no job
    /// store is wired at all and every order submission processes inline.
    pub use_queue: bool,
    /// Job worker pool size, `WORKER_CONCURRENCY` (default 2).
    pub worker_concurrency: usize,
    /// Recurring-order cycle period; daily outside of tests.
    pub scheduler_period: Duration,
    /// Wait before the timer's first cycle. Zero in production (a restarted
    /// process catches up immediately); tests push it out so the timer
    /// cannot interleave with their own seeding.
    pub scheduler_initial_delay: Duration,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });

        let worker_concurrency = std::env::var("WORKER_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2);

        let use_queue = match std::env::var("USE_REDIS") {
            Ok(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
            Err(_) => true,
        };

        Self {
            addr: std::env::var("DENTIVA_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            jwt_secret,
            redis_url: std::env::var("REDIS_URL").ok(),
            use_queue,
            worker_concurrency,
            scheduler_period: dentiva_scheduler::DailyTimer::DAY,
            scheduler_initial_delay: Duration::ZERO,
        }
    }

    /// In-process config for tests: no Redis, fast scheduler period.
    pub fn for_tests(jwt_secret: impl Into<String>) -> Self {
        Self {
            addr: "127.0.0.1:0".to_string(),
            jwt_secret: jwt_secret.into(),
            redis_url: None,
            use_queue: true,
            worker_concurrency: 2,
            scheduler_period: Duration::from_secs(3600),
            scheduler_initial_delay: Duration::from_secs(3600),
        }
    }
}
