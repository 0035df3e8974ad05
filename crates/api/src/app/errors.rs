use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use ageforge_infra::jobs::JobStoreError;

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

pub fn store_error_to_response(err: JobStoreError) -> axum::response::Response {
    tracing::error!(error = %err, "job store failure");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "store_error",
        "job store unavailable",
    )
}

/// 404 body for status lookups.
pub fn job_not_found() -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        axum::Json(json!({
            "status": "NOT_FOUND",
            "message": "Job not found",
        })),
    )
        .into_response()
}
