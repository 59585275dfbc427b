use analysis::{ErrorBody, FormatError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use llm::LlmError;
use thiserror::Error;
use tracing::{error, warn};

/// Every way a POST can fail. All of them answer 200 so the front-end never
/// sees a transport-level failure.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("empty input")]
    EmptyInput,

    #[error("upstream status {status}")]
    UpstreamHttp { status: u16, body: String },

    #[error("content blocked: {0}")]
    SafetyBlocked(String),

    /// Answered with the degraded payload, not an error body.
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("system error: {0}")]
    System(String),
}

impl From<LlmError> for RelayError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Status { status, body } => RelayError::UpstreamHttp { status, body },
            other => RelayError::System(other.to_string()),
        }
    }
}

impl RelayError {
    pub fn body(&self) -> ErrorBody {
        match self {
            RelayError::EmptyInput => ErrorBody::new("Empty input", "Please enter a thought to analyse."),
            RelayError::UpstreamHttp { status, body } => {
                ErrorBody::new("Upstream API error", format!("status {status}: {body}"))
            }
            RelayError::SafetyBlocked(detail) => ErrorBody::new("Safety", detail.clone()),
            RelayError::Format(e) => ErrorBody::new("Format error", e.reason.clone()),
            RelayError::System(detail) => ErrorBody::new("System error", detail.clone()),
        }
    }

    pub fn log(&self) {
        match self {
            RelayError::EmptyInput => {}
            RelayError::UpstreamHttp { status, body } => {
                warn!(status, body = %body, "upstream returned an error")
            }
            RelayError::SafetyBlocked(detail) => warn!(detail = %detail, "generation blocked"),
            RelayError::Format(e) => warn!(reason = %e.reason, "falling back to degraded payload"),
            RelayError::System(detail) => error!(detail = %detail, "request failed"),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let payload = match &self {
            RelayError::Format(e) => analysis::degraded(&e.cleaned),
            other => serde_json::to_value(other.body()).unwrap_or_default(),
        };
        (StatusCode::OK, Json(payload)).into_response()
    }
}
