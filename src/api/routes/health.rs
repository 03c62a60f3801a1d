//! Health Routes
//!
//! Liveness and readiness checks for orchestrators, plus a status summary
//! that reports whether insights can be enriched by the collaborator.
//!
//! - GET /health/live - Liveness check
//! - GET /health/ready - Readiness check
//! - GET /health - Collaborator, forecaster and uptime

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Always 200 while the process can answer.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness check. The engine has no dependencies it cannot
/// do without (a missing collaborator only means fallback answers), so
/// this is always 200 once the router is up.
pub async fn readiness() -> StatusCode {
    StatusCode::OK
}

/// GET /health
///
/// "degraded" means no collaborator credentials: every insight is local.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (status, collaborator) = if state.collaborator_configured {
        ("healthy", "configured")
    } else {
        ("degraded", "unconfigured")
    };

    Json(HealthResponse {
        status: status.to_string(),
        collaborator: collaborator.to_string(),
        model: state.engine.config().prompt.model.clone(),
        forecast_model: state.engine.forecast_model().as_str().to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
