use axum::{
    Router,
    routing::{get, post},
};

pub mod admin;
pub mod jobs;
pub mod orders;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/orders", post(orders::create_order))
        .route("/jobs/:id", get(jobs::job_status))
        .nest("/admin", admin::router())
}
