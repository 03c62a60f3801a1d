//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.
//!
//! Nothing about a user's history lives here; each request brings its own.

use crate::collaborator::{ChatCompletionsClient, CollaboratorError};
use crate::config::{ApiConfig, Config};
use crate::insights::InsightEngine;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Insight engine (stateless between requests)
    pub engine: Arc<InsightEngine>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Whether the collaborator has credentials
    pub collaborator_configured: bool,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState around an existing engine
    pub fn new(engine: Arc<InsightEngine>, config: ApiConfig, collaborator_configured: bool) -> Self {
        Self {
            engine,
            config: Arc::new(config),
            collaborator_configured,
            start_time: Instant::now(),
        }
    }

    /// Build the engine and its chat completions client from configuration
    pub fn from_config(config: &Config) -> Result<Self, CollaboratorError> {
        let client = ChatCompletionsClient::new(config.collaborator.client_config())?;
        let engine = InsightEngine::new(Arc::new(client), config.insight_config());

        Ok(Self::new(
            Arc::new(engine),
            config.api.clone(),
            config.collaborator.has_api_key(),
        ))
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
