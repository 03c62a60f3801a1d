//! Moodline API Server
//!
//! Run with: cargo run --bin moodline-api
//!
//! # Configuration
//!
//! Read from `config.toml` in the usual locations, then overridden by
//! environment variables:
//! - `MOODLINE_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `MOODLINE_API_PORT`: Port to listen on (default: 8000)
//! - `GROQ_API_KEY` / `MOODLINE_COLLABORATOR_API_KEY`: Collaborator credentials
//!   (optional; without them every request uses local analysis only)
//! - `MOODLINE_COLLABORATOR_MODEL`: Model name sent to the collaborator
//! - `MOODLINE_FORECAST_STRATEGY`: `regression` or `heuristic`
//! - `MOODLINE_LOG_FORMAT`: `pretty` or `json`
//! - `RUST_LOG`: Log filter (default: moodline=info,tower_http=debug)

use moodline::api::{serve, AppState};
use moodline::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("moodline={},tower_http=debug", config.logging.level).into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Moodline API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        base_url = %config.collaborator.base_url,
        model = %config.collaborator.model,
        timeout_secs = config.collaborator.client_config().timeout().as_secs(),
        "Collaborator settings"
    );
    tracing::info!(
        strategy = ?config.engine.forecast_strategy,
        alignment = ?config.engine.correlation_alignment,
        "Forecast settings"
    );

    if !config.collaborator.has_api_key() {
        tracing::warn!(
            "No collaborator API key set (GROQ_API_KEY); insights will use local analysis only"
        );
    }

    let state = AppState::from_config(&config)?;

    tracing::info!("Starting server on {}", config.api.addr());
    serve(state, &config.api).await?;

    tracing::info!("Moodline API server stopped");

    Ok(())
}
