use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Multipart, Path,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use ageforge_core::{DomainError, JobId, Submission};

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/generate", post(generate))
        .route("/status/:job_id", get(status))
        .route("/professions", get(professions))
}

#[derive(Debug, thiserror::Error)]
enum UploadError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("age must be a whole number")]
    InvalidAge,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> axum::response::Response {
        match self {
            UploadError::Multipart(e) => {
                errors::json_error(e.status(), "invalid_upload", e.body_text())
            }
            other => {
                errors::json_error(StatusCode::BAD_REQUEST, "validation_error", other.to_string())
            }
        }
    }
}

/// Raw multipart fields, before domain validation.
#[derive(Debug, Default)]
struct UploadForm {
    image: Option<Vec<u8>>,
    profession: Option<String>,
    age: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, UploadError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("image") => form.image = Some(field.bytes().await?.to_vec()),
                Some("profession") => form.profession = Some(field.text().await?),
                Some("age") => form.age = Some(field.text().await?),
                _ => {}
            }
        }
        Ok(form)
    }

    fn into_submission(self) -> Result<Submission, UploadError> {
        let image = self.image.ok_or(UploadError::MissingField("image"))?;
        let profession = self
            .profession
            .ok_or(UploadError::MissingField("profession"))?;

        let submission = match self.age.as_deref().map(str::trim) {
            None | Some("") => Submission::with_default_age(image, profession)?,
            Some(raw) => {
                let age = raw.parse().map_err(|_| UploadError::InvalidAge)?;
                Submission::new(image, profession, age)?
            }
        };
        Ok(submission)
    }
}

#[tracing::instrument(skip_all)]
pub async fn generate(
    Extension(services): Extension<Arc<AppServices>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> axum::response::Response {
    let multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            return errors::json_error(
                rejection.status(),
                "invalid_upload",
                rejection.body_text(),
            );
        }
    };

    let submission = match UploadForm::read(multipart)
        .await
        .and_then(UploadForm::into_submission)
    {
        Ok(submission) => submission,
        Err(e) => return e.into_response(),
    };

    match services.orchestrator.submit(submission) {
        Ok(job_id) => {
            (StatusCode::ACCEPTED, Json(dto::ImageResponse::started(job_id))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

#[tracing::instrument(skip(services))]
pub async fn status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(job_id): Path<String>,
) -> axum::response::Response {
    // A malformed id cannot name a job, so it is reported the same as an unknown one.
    let Ok(job_id) = job_id.parse::<JobId>() else {
        return errors::job_not_found();
    };

    match services.status.query_status(job_id) {
        Ok(Some(view)) => Json(dto::ImageResponse::from(view)).into_response(),
        Ok(None) => errors::job_not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn professions(
    Extension(services): Extension<Arc<AppServices>>,
) -> Json<Vec<&'static str>> {
    Json(services.prompts.professions())
}
