use async_trait::async_trait;
use thiserror::Error;

/// One transformation call: the source image and the prompt derived for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformationRequest {
    pub image: Vec<u8>,
    pub prompt: String,
}

impl TransformationRequest {
    pub fn new(image: Vec<u8>, prompt: impl Into<String>) -> Self {
        Self {
            image,
            prompt: prompt.into(),
        }
    }
}

/// External image transformation provider.
///
/// Latency is unbounded from the caller's point of view; timeouts, if any, are
/// enforced by the implementation and reported as [`GatewayError::Timeout`].
#[async_trait]
pub trait TransformationGateway: Send + Sync + 'static {
    /// Run the transformation and return a locator (URL) for the result.
    async fn transform(&self, request: TransformationRequest) -> Result<String, GatewayError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("gateway timed out")]
    Timeout,

    #[error("gateway rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed gateway response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// Transient failures that a retry policy may try again.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Transport(_) | GatewayError::Timeout => true,
            GatewayError::Rejected { status, .. } => *status == 429 || *status >= 500,
            GatewayError::MalformedResponse(_) => false,
        }
    }
}
