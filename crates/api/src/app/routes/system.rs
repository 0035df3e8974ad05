use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};

use ageforge_infra::jobs::JobStore;

use crate::app::{dto, errors, services::AppServices};

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.store().stats() {
        Ok(jobs) => Json(dto::HealthResponse { status: "ok", jobs }).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
