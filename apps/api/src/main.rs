mod config;
mod db;
mod errors;
mod interview;
mod llm_client;
mod results;
mod routes;
mod session;
mod state;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::session::capture::NoopCaptureBackend;
use crate::session::repository::InMemorySessionRepository;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first — a missing oracle credential fails here,
    // before any network call.
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MockPrep API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.db_max_connections).await?;

    // Initialize the oracle client
    let oracle = Arc::new(LlmClient::new(config.gemini_api_key.clone()));
    info!("Oracle client initialized (model: {})", llm_client::MODEL);

    // Build app state
    let state = AppState {
        db,
        oracle,
        capture: Arc::new(NoopCaptureBackend),
        repository: Arc::new(InMemorySessionRepository::default()),
        sessions: Arc::new(RwLock::new(HashMap::new())),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
