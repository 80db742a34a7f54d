//! Request/response DTOs.

use serde::{Deserialize, Serialize};

/// Body of `POST /orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub item_id: String,
    pub quantity: u32,
    /// Amount in minor units (cents).
    pub amount_cents: i64,
    /// ISO currency code, e.g. `"USD"`.
    pub currency: String,
}

/// Response of `POST /orders`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderResponse {
    pub order_id: String,
}

/// Response of `GET /jobs/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub kind: String,
    pub status: dentiva_jobs::JobStatus,
    pub attempt: u32,
    pub last_error: Option<String>,
}

impl From<dentiva_jobs::Job> for JobStatusResponse {
    fn from(job: dentiva_jobs::Job) -> Self {
        Self {
            job_id: job.id.to_string(),
            kind: job.kind,
            status: job.status,
            attempt: job.attempt,
            last_error: job.last_error,
        }
    }
}
