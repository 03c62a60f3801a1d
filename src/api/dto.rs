//! Data Transfer Objects
//!
//! Response types for the API endpoints. Requests are deserialized straight
//! into [`crate::analytics::WellnessHistory`]. The insight and prediction
//! responses also deserialize so the CLI can read them back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analytics::{Correlation, CorrelationAlignment, ForecastResult, TrendAnalysis};
use crate::insights::{InsightBundle, PredictionSource, SignalReport};

// ============================================
// INSIGHT DTOs
// ============================================

/// Insights response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsResponse {
    /// "improving", "declining" or "stable"
    pub mood_trend: String,
    pub prediction: PredictionDto,
    /// 3-5 entries
    pub recommendations: Vec<String>,
    /// Pair name -> coefficient, always all four standard pairs
    pub correlations: BTreeMap<String, f64>,
    /// |sleep_mood|
    pub sleep_correlation: f64,
    /// |focus_mood|
    pub focus_correlation: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,
    /// Raw collaborator answer, when there was a usable one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

/// Next-day prediction
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionDto {
    pub next_day_mood: String,
    pub confidence: f64,
    /// Local forecaster: "linear_regression_sliding_window" or "heuristic_blend"
    pub model: String,
    /// "local" or "collaborator"
    pub source: String,
}

impl From<InsightBundle> for InsightsResponse {
    fn from(bundle: InsightBundle) -> Self {
        let correlations = bundle.correlation_map();
        Self {
            mood_trend: bundle.trend.as_str().to_string(),
            prediction: PredictionDto {
                next_day_mood: bundle.prediction.next_day_mood.clone(),
                confidence: bundle.prediction.confidence,
                model: bundle.prediction.model.as_str().to_string(),
                source: match bundle.prediction.source {
                    PredictionSource::Local => "local".to_string(),
                    PredictionSource::Collaborator => "collaborator".to_string(),
                },
            },
            sleep_correlation: bundle.coefficient("sleep_mood").abs(),
            focus_correlation: bundle.coefficient("focus_mood").abs(),
            correlations,
            recommendations: bundle.recommendations,
            patterns: bundle.patterns,
            narrative: bundle.narrative,
        }
    }
}

// ============================================
// PREDICTION DTOs
// ============================================

/// Mood prediction response
#[derive(Debug, Serialize, Deserialize)]
pub struct MoodPredictionResponse {
    pub predicted_mood: String,
    pub confidence: f64,
    pub predicted_score: f64,
    pub model: String,
    /// True when the model could not be fit and a neutral value was reported
    pub fallback: bool,
}

impl From<ForecastResult> for MoodPredictionResponse {
    fn from(result: ForecastResult) -> Self {
        Self {
            predicted_mood: result.predicted_mood.as_str().to_string(),
            confidence: result.confidence,
            predicted_score: result.predicted_score,
            model: result.model.as_str().to_string(),
            fallback: result.fallback,
        }
    }
}

// ============================================
// CORRELATION DTOs
// ============================================

/// Single correlation
#[derive(Debug, Serialize)]
pub struct CorrelationDto {
    /// Pair name, e.g. "sleep_mood"
    pub pair: String,
    pub feature_a: String,
    pub feature_b: String,
    /// Pearson correlation coefficient (-1 to 1)
    pub coefficient: f64,
    /// Human-readable strength: "strong", "moderate", "weak", "negligible"
    pub strength: String,
    /// Direction: "positive", "negative" or "none"
    pub direction: String,
    /// Number of paired samples used
    pub sample_size: usize,
}

impl From<Correlation> for CorrelationDto {
    fn from(c: Correlation) -> Self {
        Self {
            pair: c.key(),
            feature_a: c.feature_a.key().to_string(),
            feature_b: c.feature_b.key().to_string(),
            coefficient: c.coefficient,
            strength: c.strength,
            direction: c.direction,
            sample_size: c.sample_size,
        }
    }
}

/// Correlations response
#[derive(Debug, Serialize)]
pub struct CorrelationsResponse {
    pub correlations: Vec<CorrelationDto>,
    /// "date" or "position"
    pub alignment: String,
    pub trend: TrendDto,
}

/// Trend classification with its statistics
#[derive(Debug, Serialize)]
pub struct TrendDto {
    pub label: String,
    pub recent_avg: f64,
    pub earlier_avg: f64,
    pub slope: f64,
}

impl From<TrendAnalysis> for TrendDto {
    fn from(t: TrendAnalysis) -> Self {
        Self {
            label: t.trend.as_str().to_string(),
            recent_avg: t.recent_avg,
            earlier_avg: t.earlier_avg,
            slope: t.slope,
        }
    }
}

impl From<SignalReport> for CorrelationsResponse {
    fn from(report: SignalReport) -> Self {
        Self {
            alignment: match report.alignment {
                CorrelationAlignment::Date => "date".to_string(),
                CorrelationAlignment::Position => "position".to_string(),
            },
            trend: report.trend.into(),
            correlations: report.correlations.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy or degraded
    pub status: String,
    /// Collaborator status: configured or unconfigured
    pub collaborator: String,
    /// Model name sent to the collaborator
    pub model: String,
    /// Local forecaster in use
    pub forecast_model: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{Feature, ForecastModel, Mood, MoodTrend};
    use crate::insights::Prediction;

    fn bundle() -> InsightBundle {
        InsightBundle {
            trend: MoodTrend::Declining,
            local_trend: TrendAnalysis::analyze(&[8.0, 8.0, 7.0, 3.0, 2.0, 2.0]),
            prediction: Prediction {
                next_day_mood: "sad".to_string(),
                confidence: 0.7,
                model: ForecastModel::LinearRegressionSlidingWindow,
                source: PredictionSource::Local,
            },
            forecast: ForecastResult::fallback(ForecastModel::LinearRegressionSlidingWindow, 0.5),
            recommendations: vec!["a".into(), "b".into(), "c".into()],
            correlations: vec![
                Correlation::new(Feature::SleepHours, Feature::Mood, -0.8, 6),
                Correlation::new(Feature::FocusScore, Feature::Mood, 0.4, 6),
                Correlation::new(Feature::SleepQuality, Feature::Mood, 0.0, 6),
                Correlation::new(Feature::Xp, Feature::Mood, 0.0, 0),
            ],
            patterns: Vec::new(),
            narrative: None,
        }
    }

    #[test]
    fn test_insights_response_shape() {
        let json = serde_json::to_value(InsightsResponse::from(bundle())).unwrap();

        assert_eq!(json["moodTrend"], "declining");
        assert_eq!(json["prediction"]["nextDayMood"], "sad");
        assert_eq!(json["prediction"]["model"], "linear_regression_sliding_window");
        assert_eq!(json["prediction"]["source"], "local");
        assert_eq!(json["sleepCorrelation"], 0.8);
        assert_eq!(json["focusCorrelation"], 0.4);
        assert_eq!(json["correlations"]["sleep_mood"], -0.8);
        assert_eq!(json["correlations"].as_object().unwrap().len(), 4);
        assert!(json.get("patterns").is_none());
        assert!(json.get("narrative").is_none());
    }

    #[test]
    fn test_prediction_response_shape() {
        let result = ForecastResult::fallback(ForecastModel::HeuristicBlend, 0.5);
        let json = serde_json::to_value(MoodPredictionResponse::from(result)).unwrap();

        assert_eq!(json["predicted_mood"], Mood::Neutral.as_str());
        assert_eq!(json["model"], "heuristic_blend");
        assert_eq!(json["fallback"], true);
    }
}
