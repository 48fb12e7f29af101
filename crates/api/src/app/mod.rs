//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: booking service wiring and the blocking-call bridge
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use eventive_infra::config::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(build_router(Arc::new(services)))
}

/// Build the router around already-wired services.
pub fn build_router(services: Arc<AppServices>) -> Router {
    let api = routes::router().layer(
        ServiceBuilder::new()
            .layer(Extension(services))
            .layer(axum::middleware::from_fn(middleware::caller_middleware)),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(api)
}

pub use services::AppServices;
