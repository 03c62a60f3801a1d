//! Insight Routes
//!
//! - POST /api/v1/insights - Trend, prediction, recommendations and
//!   correlations for a supplied history

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::analytics::WellnessHistory;
use crate::api::dto::InsightsResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// POST /api/v1/insights
///
/// Runs the local analytics and asks the collaborator for its opinion.
/// Collaborator failures never fail the request; only a history with fewer
/// than two mood entries is rejected.
pub async fn compute_insights(
    State(state): State<Arc<AppState>>,
    Json(history): Json<WellnessHistory>,
) -> ApiResult<Json<InsightsResponse>> {
    tracing::debug!(
        moods = history.mood_data.len(),
        sleep = history.sleep_data.len(),
        focus = history.focus_data.len(),
        xp = history.xp_data.len(),
        "Computing insights"
    );

    let bundle = state.engine.generate(history).await?;
    Ok(Json(bundle.into()))
}
