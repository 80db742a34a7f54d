use std::sync::Arc;

use axum::{Json, Router, extract::Extension, http::StatusCode, response::IntoResponse, routing::post};
use chrono::Utc;

use crate::app::errors::json_error;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/recurring/run", post(run_recurring_cycle))
}

/// `POST /admin/recurring/run` — trigger one scheduling cycle now.
///
/// The daily timer runs the same cycle; this exists for operators and
/// tests.
pub async fn run_recurring_cycle(
    Extension(services): Extension<Arc<AppServices>>,
) -> impl IntoResponse {
    let today = Utc::now().date_naive();

    // run_cycle blocks on ERP/queue calls, so keep it off the async worker.
    let scheduler = services.clone();
    let report =
        tokio::task::spawn_blocking(move || scheduler.scheduler.run_cycle(today)).await;

    match report {
        Ok(Ok(report)) => Json(report).into_response(),
        Ok(Err(e)) => json_error(StatusCode::BAD_GATEWAY, "erp_error", e.to_string()),
        Err(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "scheduler_panicked",
            e.to_string(),
        ),
    }
}
