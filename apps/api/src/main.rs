mod config;
mod errors;
mod llm_client;
mod quotes;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::gemini::GeminiBackend;
use crate::llm_client::GenerationClient;
use crate::quotes::service::QuoteService;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing GEMINI_API_KEY)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Quote API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the backend once; every request shares this handle
    let backend = GeminiBackend::new(config.gemini_api_key.clone(), config.gemini_model.clone())?;
    let defaults = config.generation_defaults();
    let client = GenerationClient::new(Arc::new(backend), defaults);
    info!(
        "Generation client initialized (model: {}, timeout: {}s, temperature: {}, max_tokens: {})",
        client.model(),
        defaults.timeout.as_secs(),
        defaults.temperature,
        defaults.max_tokens
    );

    let state = AppState {
        quotes: Arc::new(QuoteService::new(client)),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
