//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: job system wiring (store, orchestrator, status query)
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, extract::DefaultBodyLimit, routing::get};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Any origin may call the API; the browser frontend is served from elsewhere.
pub fn build_app(services: Arc<AppServices>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/images", routes::images::router())
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(axum::middleware::from_fn(middleware::request_logging))
                .layer(DefaultBodyLimit::max(max_upload_bytes))
                .layer(Extension(services)),
        )
}
