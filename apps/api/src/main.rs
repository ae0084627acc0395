mod cleanup;
mod config;
mod errors;
mod generation;
mod layout;
mod llm_client;
mod models;
mod render;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::layout::{FetchLimits, LayoutConfig, OpenverseImageSearch};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Slidesmith API v{}", env!("CARGO_PKG_VERSION"));

    // Capacity model: validated once here, never re-checked per slide.
    let layout = LayoutConfig {
        max_lines_per_slide: config.max_lines_per_slide,
        ..LayoutConfig::default()
    };
    layout
        .validate()
        .context("invalid slide capacity configuration")?;
    info!(
        "Layout capacity: {} lines/slide, {} levels",
        layout.max_lines_per_slide,
        layout.levels.len()
    );

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Output directory for generated decks
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("failed to create {}", config.output_dir.display()))?;

    // Background artifact sweep
    cleanup::spawn_sweeper(
        config.output_dir.clone(),
        Duration::from_secs(config.artifact_ttl_secs),
        Duration::from_secs(config.cleanup_interval_secs),
    );

    let fetch_limits = FetchLimits {
        concurrency: config.image_fetch_concurrency,
        timeout: Duration::from_secs(config.image_fetch_timeout_secs),
    };

    // Build app state
    let state = AppState {
        llm,
        config: config.clone(),
        layout,
        image_search: Arc::new(OpenverseImageSearch::new()),
        fetch_limits,
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
