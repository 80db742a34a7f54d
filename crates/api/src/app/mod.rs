//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: infrastructure wiring (ERP seam, gateway, bus, queue,
//!   workers, scheduler)
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router plus the running services behind it.
pub fn build_app(config: &ApiConfig) -> (Router, Arc<AppServices>) {
    let jwt = Arc::new(dentiva_auth::Hs256JwtValidator::new(
        config.jwt_secret.as_bytes(),
    ));
    let auth_state = middleware::AuthState { jwt };

    let services = services::build_services(config);

    // Auth is the outermost layer so unauthenticated requests are rejected
    // before anything else runs.
    let protected = routes::router().layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::auth_middleware,
            ))
            .layer(Extension(services.clone())),
    );

    let router = Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected);

    (router, services)
}
