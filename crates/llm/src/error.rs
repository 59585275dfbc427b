use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// Upstream answered with a non-success HTTP status.
    #[error("upstream status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("invalid upstream json: {0}")]
    Decode(#[source] serde_json::Error),
}

impl LlmError {
    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Transport(err)
        }
    }
}
