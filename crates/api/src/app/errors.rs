//! Consistent JSON error responses.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use dentiva_scheduler::ProcessError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn process_error_to_response(err: ProcessError) -> axum::response::Response {
    match err {
        ProcessError::Payload(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_order", msg),
        ProcessError::Erp(e) => json_error(StatusCode::BAD_GATEWAY, "erp_error", e.to_string()),
        ProcessError::Publish(msg) => json_error(StatusCode::BAD_GATEWAY, "publish_error", msg),
    }
}
