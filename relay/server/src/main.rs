use anyhow::Result;
use dotenvy::dotenv;
use std::{env, net::SocketAddr};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thought_relay::{cors_layer, router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "thought_relay=info,llm=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    if config.api_key.is_empty() {
        warn!("GEMINI_API_KEY is not set, upstream calls will be rejected");
    }

    let state = AppState::from_config(&config)?;
    let app = router(state, cors_layer(&config.allowed_origin)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server listening on {}", addr);
    info!("Upstream model: {} (timeout {:?})", config.model, config.upstream_timeout);
    info!("Allowed origin: {}", config.allowed_origin);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
