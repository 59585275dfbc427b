pub mod config;
pub mod error;
pub mod handlers;

use analysis::PromptBuilder;
use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{header::HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use llm::{GenerateOptions, SafetySetting};
use std::{any::Any, sync::Arc};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{self, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

pub use config::Config;
pub use error::RelayError;

/// Sampling temperature sent with every analysis request.
pub const TEMPERATURE: f32 = 0.2;

/// Immutable per-process state shared by all requests.
#[derive(Clone)]
pub struct AppState {
    pub client: llm::Client,
    pub prompts: Arc<PromptBuilder>,
    pub options: Arc<GenerateOptions>,
}

impl AppState {
    pub fn new(client: llm::Client, prompts: PromptBuilder, safety_relaxed: bool) -> Self {
        let options = GenerateOptions {
            temperature: Some(TEMPERATURE),
            json_output: true,
            safety: if safety_relaxed { SafetySetting::relaxed() } else { Vec::new() },
        };
        Self {
            client,
            prompts: Arc::new(prompts),
            options: Arc::new(options),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let prompts = match &config.prompt_file {
            Some(path) => {
                let builder = PromptBuilder::from_file(path)?;
                info!("Loaded prompt template from {}", path.display());
                builder
            }
            None => PromptBuilder::default(),
        };
        let client = llm::Client::new(config.api_key.clone(), config.model.clone())
            .context("Failed to build upstream client")?
            .with_base_url(config.base_url.as_str())
            .with_timeout(config.upstream_timeout);
        Ok(Self::new(client, prompts, config.safety_relaxed))
    }
}

pub fn cors_layer(allowed_origin: &str) -> Result<CorsLayer> {
    if allowed_origin == "*" {
        return Ok(CorsLayer::permissive());
    }
    let origin = HeaderValue::from_str(allowed_origin)
        .with_context(|| format!("ALLOWED_ORIGIN is not a valid header value: {allowed_origin}"))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(cors::Any))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "handler panicked".to_string());
    error!(detail = %detail, "handler panicked");
    RelayError::System(detail).into_response()
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let routes = Router::new().route(
        "/",
        get(handlers::liveness)
            .post(handlers::analyze)
            .options(handlers::preflight),
    );
    with_layers(routes, state, cors)
}

/// Shared middleware stack. CORS sits outermost so panic responses carry the
/// allow-origin header too.
pub fn with_layers(routes: Router, state: AppState, cors: CorsLayer) -> Router {
    routes
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
}
