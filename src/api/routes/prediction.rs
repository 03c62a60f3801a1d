//! Prediction Routes
//!
//! - POST /api/v1/mood-prediction - Next-day mood from the local forecaster

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::analytics::WellnessHistory;
use crate::api::dto::MoodPredictionResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// POST /api/v1/mood-prediction
///
/// The collaborator is not consulted.
pub async fn predict_mood(
    State(state): State<Arc<AppState>>,
    Json(history): Json<WellnessHistory>,
) -> ApiResult<Json<MoodPredictionResponse>> {
    let result = state.engine.predict(history).await?;
    Ok(Json(result.into()))
}
