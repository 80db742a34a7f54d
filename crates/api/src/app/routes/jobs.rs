use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use dentiva_jobs::JobId;

use crate::app::dto::JobStatusResponse;
use crate::app::errors::json_error;
use crate::app::services::AppServices;

/// `GET /jobs/{id}` — status of a queued order job.
pub async fn job_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match services.queue.check_status(JobId::from_uuid(id)) {
        Ok(Some(job)) => Json(JobStatusResponse::from(job)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "job_not_found", id.to_string()),
        Err(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "job_store_error",
            e.to_string(),
        ),
    }
}
