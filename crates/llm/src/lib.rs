mod error;
mod safety;

pub use error::LlmError;
pub use safety::{HarmBlockThreshold, HarmCategory, SafetySetting};

use reqwest::Client as Http;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);

#[derive(Clone, Debug)]
pub struct Client {
    http: Http,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

#[derive(Clone, Debug, Default)]
pub struct GenerateOptions {
    pub temperature: Option<f32>,
    /// Ask for `application/json` output.
    pub json_output: bool,
    pub safety: Vec<SafetySetting>,
}

/// Why the upstream model stopped generating.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Blocklist,
    ProhibitedContent,
    Spii,
    Other(String),
}

impl FinishReason {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            "SAFETY" => FinishReason::Safety,
            "RECITATION" => FinishReason::Recitation,
            "BLOCKLIST" => FinishReason::Blocklist,
            "PROHIBITED_CONTENT" => FinishReason::ProhibitedContent,
            "SPII" => FinishReason::Spii,
            other => FinishReason::Other(other.to_string()),
        }
    }

    /// Natural stop or length limit. Everything else means the model declined.
    pub fn is_normal(&self) -> bool {
        matches!(self, FinishReason::Stop | FinishReason::MaxTokens)
    }

    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "STOP",
            FinishReason::MaxTokens => "MAX_TOKENS",
            FinishReason::Safety => "SAFETY",
            FinishReason::Recitation => "RECITATION",
            FinishReason::Blocklist => "BLOCKLIST",
            FinishReason::ProhibitedContent => "PROHIBITED_CONTENT",
            FinishReason::Spii => "SPII",
            FinishReason::Other(s) => s,
        }
    }
}

/// What came back from one `generateContent` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Completion {
    pub text: Option<String>,
    pub finish_reason: Option<FinishReason>,
    /// Set when the prompt itself was rejected (`promptFeedback.blockReason`).
    pub block_reason: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "no_settings")]
    safety_settings: &'a [SafetySetting],
}

fn no_settings(settings: &&[SafetySetting]) -> bool {
    settings.is_empty()
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl Client {
    pub fn new(api_key: String, model: String) -> Result<Self, LlmError> {
        Ok(Self {
            http: Http::builder()
                .pool_max_idle_per_host(8)
                .build()
                .map_err(LlmError::Transport)?,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// One `generateContent` call. No retries.
    pub async fn generate(&self, prompt: &str, opts: &GenerateOptions) -> Result<Completion, LlmError> {
        let generation_config = if opts.temperature.is_some() || opts.json_output {
            Some(GenerationConfig {
                temperature: opts.temperature,
                response_mime_type: opts.json_output.then_some("application/json"),
            })
        } else {
            None
        };
        let body = GenerateRequest {
            contents: [Content { parts: [Part { text: prompt }] }],
            generation_config,
            safety_settings: &opts.safety,
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "calling generateContent");

        let resp = self.http.post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send().await
            .map_err(LlmError::from_send)?;

        let status = resp.status();
        if !status.is_success() {
            let body = match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(error = %e, "failed to read upstream error body");
                    format!("<unreadable body: {e}>")
                }
            };
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        let raw = resp.text().await.map_err(LlmError::from_send)?;
        let parsed: GenerateResponse = serde_json::from_str(&raw).map_err(LlmError::Decode)?;
        Ok(parsed.into_completion())
    }

    /// Simple helper for one-shot prompts.
    pub async fn simple(&self, prompt: &str) -> Result<Completion, LlmError> {
        self.generate(prompt, &GenerateOptions::default()).await
    }
}

impl GenerateResponse {
    fn into_completion(self) -> Completion {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let Some(first) = self.candidates.into_iter().next() else {
            return Completion { text: None, finish_reason: None, block_reason };
        };

        let text = first.content.and_then(|c| {
            let joined: String = c.parts.iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect();
            if joined.is_empty() { None } else { Some(joined) }
        });

        Completion {
            text,
            finish_reason: first.finish_reason.as_deref().map(FinishReason::parse),
            block_reason,
        }
    }
}
