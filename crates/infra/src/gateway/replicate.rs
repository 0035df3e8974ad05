//! Replicate predictions API adapter.

use async_trait::async_trait;
use base64::prelude::*;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ageforge_ai::{GatewayError, TransformationGateway, TransformationRequest};

use crate::config::GatewayConfig;

const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    version: &'a str,
    input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
    image: String,
    num_outputs: u32,
    image_dimensions: &'a str,
    num_inference_steps: u32,
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    stream: Option<String>,
}

/// Gateway backed by `POST /v1/predictions`.
///
/// Only `201 Created` carrying `urls.stream` counts as success; the stream URL
/// is the job's result locator.
pub struct ReplicateGateway {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl ReplicateGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl TransformationGateway for ReplicateGateway {
    async fn transform(&self, request: TransformationRequest) -> Result<String, GatewayError> {
        let body = PredictionRequest {
            version: &self.config.model_version,
            input: PredictionInput {
                prompt: &request.prompt,
                image: BASE64_STANDARD.encode(&request.image),
                num_outputs: self.config.num_outputs,
                image_dimensions: &self.config.image_dimensions,
                num_inference_steps: self.config.num_inference_steps,
            },
        };

        debug!(
            endpoint = %self.config.endpoint,
            model = %self.config.model_version,
            "creating prediction"
        );

        let response = self
            .http
            .post(&self.config.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Token {}", self.config.api_key),
            )
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY));
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PredictionResponse = response
            .json()
            .await
            .map_err(|e| match transport_error(e) {
                GatewayError::Transport(msg) => GatewayError::MalformedResponse(msg),
                other => other,
            })?;

        parsed
            .urls
            .and_then(|urls| urls.stream)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| GatewayError::MalformedResponse("missing urls.stream".to_string()))
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Transport(e.to_string())
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0)
}
