use analysis::Mode;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::{error::RelayError, AppState};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ThoughtRequest {
    pub thought: Option<String>,
    pub mode: Option<String>,
}

impl ThoughtRequest {
    /// JSON first whatever the content type, then form encoding, else empty.
    pub fn parse(body: &[u8]) -> Self {
        if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
            let field = |key: &str| map.get(key).and_then(Value::as_str).map(String::from);
            return Self { thought: field("thought"), mode: field("mode") };
        }

        let mut req = Self::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "thought" => req.thought = Some(value.into_owned()),
                "mode" => req.mode = Some(value.into_owned()),
                _ => {}
            }
        }
        req
    }

    /// Trimmed thought, `None` when blank or missing.
    pub fn thought(&self) -> Option<&str> {
        self.thought.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[derive(Serialize)]
struct Liveness {
    status: &'static str,
    message: &'static str,
}

pub async fn liveness() -> impl IntoResponse {
    Json(Liveness { status: "online", message: "Thought relay is online" })
}

pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Body rejections (size limit, aborted upload) go through the same 200 boundary.
pub async fn analyze(
    Extension(state): Extension<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("analyze", %request_id);

    let result = match body {
        Ok(body) => run(&state, &body).instrument(span.clone()).await,
        Err(rejection) => Err(RelayError::System(rejection.body_text())),
    };
    match result {
        Ok(value) => Json(value).into_response(),
        Err(err) => {
            span.in_scope(|| err.log());
            err.into_response()
        }
    }
}

async fn run(state: &AppState, body: &[u8]) -> Result<Value, RelayError> {
    let req = ThoughtRequest::parse(body);
    let thought = req.thought().ok_or(RelayError::EmptyInput)?;
    let mode = Mode::from_param(req.mode.as_deref());

    let prompt = state.prompts.build(thought, mode);
    info!(?mode, thought_len = thought.chars().count(), "analysing thought");

    let completion = state.client.generate(&prompt, &state.options).await?;

    if let Some(reason) = completion.block_reason {
        return Err(RelayError::SafetyBlocked(format!("prompt blocked: {reason}")));
    }
    if let Some(reason) = completion.finish_reason.as_ref().filter(|r| !r.is_normal()) {
        return Err(RelayError::SafetyBlocked(format!("generation stopped: {}", reason.as_str())));
    }
    let text = completion
        .text
        .ok_or_else(|| RelayError::SafetyBlocked("no content generated".to_string()))?;

    let mut map = analysis::parse_analysis(&text)?;
    analysis::backfill(&mut map);
    debug!(keys = map.len(), "analysis parsed");
    Ok(Value::Object(map))
}
