use serde::Serialize;

use ageforge_infra::jobs::{JobStats, JobStatus, JobStatusView};

pub const STARTED_MESSAGE: &str = "Image generation started. Use jobId to check status.";

/// Body for both the submit acknowledgement and status lookups.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub message: String,
}

impl ImageResponse {
    pub fn started(job_id: impl ToString) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: JobStatus::Processing,
            image_url: None,
            message: STARTED_MESSAGE.to_string(),
        }
    }
}

impl From<JobStatusView> for ImageResponse {
    fn from(view: JobStatusView) -> Self {
        Self {
            job_id: view.job_id.to_string(),
            status: view.status,
            image_url: view.result_url,
            message: view.message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub jobs: JobStats,
}
