use anyhow::{Context, Result};
use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 25;

/// Process configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub port: u16,
    /// `*` allows any origin.
    pub allowed_origin: String,
    pub upstream_timeout: Duration,
    pub prompt_file: Option<PathBuf>,
    pub safety_relaxed: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port: u16 = match var("PORT") {
            Some(raw) => raw.parse().with_context(|| format!("PORT is not a valid port: {raw}"))?,
            None => DEFAULT_PORT,
        };
        let timeout_secs: u64 = match var("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("UPSTREAM_TIMEOUT_SECS is not a number: {raw}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let safety_relaxed = match var("SAFETY_RELAXED") {
            Some(raw) => parse_flag(&raw)
                .with_context(|| format!("SAFETY_RELAXED must be true or false: {raw}"))?,
            None => true,
        };

        Ok(Self {
            api_key: var("GEMINI_API_KEY").unwrap_or_default(),
            model: var("GEMINI_MODEL").unwrap_or_else(|| llm::DEFAULT_MODEL.to_string()),
            base_url: var("GEMINI_BASE_URL").unwrap_or_else(|| llm::DEFAULT_BASE_URL.to_string()),
            port,
            allowed_origin: var("ALLOWED_ORIGIN").unwrap_or_else(|| "*".to_string()),
            upstream_timeout: Duration::from_secs(timeout_secs),
            prompt_file: var("PROMPT_FILE").map(PathBuf::from),
            safety_relaxed,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
