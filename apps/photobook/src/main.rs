mod config;
mod editing;
mod errors;
mod layout;
mod llm_client;
mod models;
mod planning;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::layout::{AspectFitScorer, FitScorer, LayoutCatalog};
use crate::llm_client::LlmClient;
use crate::planning::{LayoutPlanner, LlmLayoutPlanner};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on invalid env values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting photobook service v{}", env!("CARGO_PKG_VERSION"));

    // Load the layout catalog (file override or bundled)
    let catalog = match &config.layout_catalog_path {
        Some(path) => LayoutCatalog::from_path(path)
            .with_context(|| format!("Failed to load layout catalog from {}", path.display()))?,
        None => LayoutCatalog::bundled().context("Bundled layout catalog is invalid")?,
    };
    info!(
        "Layout catalog ready: {} layouts, fallback {}",
        catalog.list_layouts().len(),
        catalog.fallback_layout().name
    );

    let scorer: Arc<dyn FitScorer> = Arc::new(AspectFitScorer::default());
    info!("Fit scorer: {}", scorer.backend());

    // External planner is optional; without a key every album is composed locally
    let planner: Option<Arc<dyn LayoutPlanner>> = match &config.anthropic_api_key {
        Some(key) => {
            let llm = LlmClient::new(key.clone(), config.planner_timeout)
                .context("Failed to initialize LLM client")?;
            info!(
                "External planner enabled (model: {}, timeout {:?})",
                llm_client::MODEL,
                config.planner_timeout
            );
            let planner: Arc<dyn LayoutPlanner> = Arc::new(LlmLayoutPlanner(llm));
            Some(planner)
        }
        None => {
            info!("External planner disabled; composing deterministically");
            None
        }
    };

    let state = AppState {
        catalog: Arc::new(catalog),
        scorer,
        planner,
        config: config.clone(),
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
