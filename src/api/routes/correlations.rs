//! Correlation Routes
//!
//! - POST /api/v1/correlations - Pearson correlations and trend for a
//!   supplied history

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::analytics::WellnessHistory;
use crate::api::dto::CorrelationsResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// POST /api/v1/correlations
///
/// Every standard pair is returned, including those with a zero
/// coefficient.
pub async fn compute_correlations(
    State(state): State<Arc<AppState>>,
    Json(history): Json<WellnessHistory>,
) -> ApiResult<Json<CorrelationsResponse>> {
    let report = state.engine.signals(&history)?;
    Ok(Json(report.into()))
}
