//! Insight Engine
//!
//! Arbitrates between the local analytics and the text-generation
//! collaborator. The collaborator call and the local computations run
//! concurrently; the local results always survive, the collaborator's
//! opinion is layered on top only when it answered with usable JSON in
//! time.

use crate::analytics::{
    correlation_map, Correlation, CorrelationAlignment, CorrelationEngine, Feature, FeatureSeries,
    FeatureTable, ForecastModel, ForecastResult, ForecastStrategy, Forecaster, Mood, MoodTrend,
    TrendAnalysis, WellnessHistory, DEGENERATE_FIT_CONFIDENCE, HEURISTIC_CONFIDENCE_MAX,
    HEURISTIC_CONFIDENCE_MIN, STANDARD_PAIRS,
};
use crate::collaborator::{parse_insights, CollaboratorInsights, CompletionRequest, TextGenerator};
use crate::insights::prompt::{build_request, PromptSettings};
use crate::insights::recommendations::{
    assemble, clamp_threshold, correlation_observations, fallback_recommendations,
    DEFAULT_CORRELATION_THRESHOLD,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Fewest mood entries a request may carry
pub const MIN_MOOD_ENTRIES: usize = 2;

/// Engine settings, normally derived from [`crate::config::Config`]
#[derive(Debug, Clone)]
pub struct InsightConfig {
    pub prompt: PromptSettings,
    /// Upper bound on the collaborator call; the fallback path runs after it
    pub collaborator_timeout: Duration,
    pub forecast_strategy: ForecastStrategy,
    /// Seed for the heuristic forecaster's noise
    pub forecast_seed: Option<u64>,
    pub correlation_alignment: CorrelationAlignment,
    /// |r| above which a correlation is turned into a recommendation
    pub recommendation_threshold: f64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            prompt: PromptSettings::default(),
            collaborator_timeout: Duration::from_secs(30),
            forecast_strategy: ForecastStrategy::default(),
            forecast_seed: None,
            correlation_alignment: CorrelationAlignment::default(),
            recommendation_threshold: DEFAULT_CORRELATION_THRESHOLD,
        }
    }
}

/// Where the reported prediction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    Local,
    Collaborator,
}

/// Final next-day prediction after merging
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub next_day_mood: String,
    /// max(local, collaborator), within [0.3, 0.95]
    pub confidence: f64,
    /// Local forecaster behind the numeric estimate
    pub model: ForecastModel,
    pub source: PredictionSource,
}

/// Everything produced for one insights request
#[derive(Debug, Clone, Serialize)]
pub struct InsightBundle {
    pub trend: MoodTrend,
    /// Local classification, kept even when the collaborator's trend won
    pub local_trend: TrendAnalysis,
    pub prediction: Prediction,
    /// Local forecast before merging
    pub forecast: ForecastResult,
    /// 3-5 entries, no duplicates
    pub recommendations: Vec<String>,
    /// One entry per standard pair
    pub correlations: Vec<Correlation>,
    pub patterns: Vec<String>,
    /// Raw collaborator text when it answered with usable JSON
    pub narrative: Option<String>,
}

impl InsightBundle {
    /// Pair name -> coefficient
    pub fn correlation_map(&self) -> BTreeMap<String, f64> {
        correlation_map(&self.correlations)
    }

    /// Coefficient for a pair such as "sleep_mood" (0 when absent)
    pub fn coefficient(&self, key: &str) -> f64 {
        self.correlations
            .iter()
            .find(|c| c.key() == key)
            .map(|c| c.coefficient)
            .unwrap_or(0.0)
    }

    pub fn collaborator_used(&self) -> bool {
        self.narrative.is_some()
    }
}

/// Correlations and trend for one history, without forecast or collaborator
#[derive(Debug, Clone, Serialize)]
pub struct SignalReport {
    pub trend: TrendAnalysis,
    pub alignment: CorrelationAlignment,
    pub correlations: Vec<Correlation>,
}

/// Results of the CPU-side analysis
#[derive(Debug, Clone)]
struct LocalAnalysis {
    correlations: Vec<Correlation>,
    forecast: ForecastResult,
}

impl LocalAnalysis {
    fn compute(
        history: &WellnessHistory,
        correlations: &CorrelationEngine,
        forecaster: &Forecaster,
    ) -> Self {
        let table = FeatureTable::build(history);
        Self {
            correlations: correlations.calculate_all(history),
            forecast: forecaster.forecast(&table),
        }
    }

    /// Stand-in when the analysis task itself failed
    fn degraded(model: ForecastModel) -> Self {
        Self {
            correlations: STANDARD_PAIRS
                .iter()
                .map(|&(a, b)| Correlation::new(a, b, 0.0, 0))
                .collect(),
            forecast: ForecastResult::fallback(model, DEGENERATE_FIT_CONFIDENCE),
        }
    }
}

/// A usable collaborator answer
#[derive(Debug, Clone)]
struct CollaboratorReply {
    insights: CollaboratorInsights,
    raw: String,
}

/// Generate insights from a caller-supplied history
pub struct InsightEngine {
    generator: Arc<dyn TextGenerator>,
    config: InsightConfig,
    correlations: CorrelationEngine,
    forecaster: Forecaster,
}

impl InsightEngine {
    /// Create a new insight engine
    pub fn new(generator: Arc<dyn TextGenerator>, mut config: InsightConfig) -> Self {
        config.recommendation_threshold = clamp_threshold(config.recommendation_threshold);
        Self {
            generator,
            correlations: CorrelationEngine::new(config.correlation_alignment),
            forecaster: Forecaster::new(config.forecast_strategy, config.forecast_seed),
            config,
        }
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    /// Name of the text generator, for health output
    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    pub fn forecast_model(&self) -> ForecastModel {
        self.forecaster.model()
    }

    /// Reject histories too short to analyze
    pub fn validate(history: &WellnessHistory) -> Result<(), InsightError> {
        let found = history.mood_data.len();
        if found < MIN_MOOD_ENTRIES {
            return Err(InsightError::InsufficientMoodData { found });
        }
        Ok(())
    }

    /// Compute the full insight bundle.
    ///
    /// Only validation can fail. Collaborator errors, timeouts and bad JSON
    /// fall back to the local results and the static recommendation table.
    pub async fn generate(&self, history: WellnessHistory) -> Result<InsightBundle, InsightError> {
        Self::validate(&history)?;

        let local_trend = local_trend(&history);
        let request = build_request(&history, local_trend.trend, &self.config.prompt);

        let local_task = {
            let correlations = self.correlations;
            let forecaster = self.forecaster.clone();
            tokio::task::spawn_blocking(move || {
                LocalAnalysis::compute(&history, &correlations, &forecaster)
            })
        };

        let (local, reply) = tokio::join!(local_task, self.consult(&request));

        let local = local.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Local analysis task failed, using neutral results");
            LocalAnalysis::degraded(self.forecaster.model())
        });

        let bundle = self.merge(local_trend, local, reply);

        tracing::info!(
            trend = %bundle.trend,
            prediction = %bundle.prediction.next_day_mood,
            confidence = bundle.prediction.confidence,
            collaborator = bundle.collaborator_used(),
            "Generated insights"
        );

        Ok(bundle)
    }

    /// Trend and correlations only
    pub fn signals(&self, history: &WellnessHistory) -> Result<SignalReport, InsightError> {
        Self::validate(history)?;
        Ok(SignalReport {
            trend: local_trend(history),
            alignment: self.correlations.alignment(),
            correlations: self.correlations.calculate_all(history),
        })
    }

    /// Local forecast only; the collaborator is not consulted
    pub async fn predict(&self, history: WellnessHistory) -> Result<ForecastResult, InsightError> {
        Self::validate(&history)?;

        let forecaster = self.forecaster.clone();
        let result = tokio::task::spawn_blocking(move || {
            forecaster.forecast(&FeatureTable::build(&history))
        })
        .await;

        Ok(result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Forecast task failed, using neutral forecast");
            ForecastResult::fallback(self.forecaster.model(), DEGENERATE_FIT_CONFIDENCE)
        }))
    }

    /// Ask the collaborator, absorbing every failure
    async fn consult(&self, request: &CompletionRequest) -> Option<CollaboratorReply> {
        let timeout = self.config.collaborator_timeout;
        let raw = match tokio::time::timeout(timeout, self.generator.complete(request)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, generator = self.generator.name(), "Collaborator request failed, using fallback");
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    generator = self.generator.name(),
                    "Collaborator timed out, using fallback"
                );
                return None;
            }
        };

        match parse_insights(&raw) {
            Ok(insights) => {
                tracing::debug!(
                    trend = ?insights.trend,
                    recommendations = insights.recommendations.len(),
                    "Parsed collaborator insights"
                );
                Some(CollaboratorReply { insights, raw })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unusable collaborator response, using fallback");
                None
            }
        }
    }

    fn merge(
        &self,
        local_trend: TrendAnalysis,
        local: LocalAnalysis,
        reply: Option<CollaboratorReply>,
    ) -> InsightBundle {
        let (insights, narrative) = match reply {
            Some(reply) => (reply.insights, Some(reply.raw)),
            None => (CollaboratorInsights::default(), None),
        };

        // Unknown trend labels from the collaborator are ignored
        let trend = insights
            .trend
            .as_deref()
            .and_then(MoodTrend::parse)
            .unwrap_or(local_trend.trend);

        let base = if insights.recommendations.is_empty() {
            fallback_recommendations(trend)
        } else {
            insights.recommendations
        };
        let observations =
            correlation_observations(&local.correlations, self.config.recommendation_threshold);
        let recommendations = assemble(base, observations);

        let local_confidence = local.forecast.confidence;
        let confidence = insights
            .confidence
            .map_or(local_confidence, |c| c.max(local_confidence))
            .clamp(HEURISTIC_CONFIDENCE_MIN, HEURISTIC_CONFIDENCE_MAX);

        let (next_day_mood, source) = match insights.prediction_mood.as_deref() {
            Some(label) => (normalize_label(label), PredictionSource::Collaborator),
            None => (
                local.forecast.predicted_mood.as_str().to_string(),
                PredictionSource::Local,
            ),
        };

        InsightBundle {
            trend,
            local_trend,
            prediction: Prediction {
                next_day_mood,
                confidence,
                model: local.forecast.model,
                source,
            },
            forecast: local.forecast,
            recommendations,
            correlations: local.correlations,
            patterns: insights.patterns,
            narrative,
        }
    }
}

fn local_trend(history: &WellnessHistory) -> TrendAnalysis {
    TrendAnalysis::analyze(&FeatureSeries::from_history(history, Feature::Mood).chronological())
}

/// Known moods are canonicalized; anything else is kept lowercased
fn normalize_label(label: &str) -> String {
    match Mood::parse(label) {
        Some(mood) => mood.as_str().to_string(),
        None => label.trim().to_lowercase(),
    }
}

/// Errors that can occur during insight generation
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("need at least 2 mood entries")]
    InsufficientMoodData { found: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::REGRESSION_CONFIDENCE_MAX;
    use crate::collaborator::ScriptedGenerator;
    use chrono::NaiveDate;

    const PROSE_WRAPPED_REPLY: &str = "Sure! {\"trend\":\"improving\",\"recommendations\":[\"Take an evening walk\",\"Keep a gratitude journal\"],\"prediction_mood\":\"happy\",\"confidence\":0.8} Hope this helps!";

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn moods(labels: &[&str]) -> WellnessHistory {
        WellnessHistory::from_moods(
            labels
                .iter()
                .enumerate()
                .map(|(i, l)| (day(i as u32 + 1), l.to_string())),
        )
    }

    fn engine(generator: Arc<ScriptedGenerator>) -> InsightEngine {
        InsightEngine::new(generator, InsightConfig::default())
    }

    fn assert_recommendation_invariants(recs: &[String]) {
        assert!((3..=5).contains(&recs.len()), "got {} recommendations", recs.len());
        let mut unique = recs.to_vec();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), recs.len());
    }

    #[tokio::test]
    async fn test_rejects_single_mood_without_calling_collaborator() {
        let generator = Arc::new(ScriptedGenerator::replying(PROSE_WRAPPED_REPLY));
        let engine = engine(generator.clone());

        let err = engine.generate(moods(&["happy"])).await.unwrap_err();
        assert!(matches!(err, InsightError::InsufficientMoodData { found: 1 }));
        assert_eq!(err.to_string(), "need at least 2 mood entries");
        assert_eq!(generator.calls(), 0);

        assert!(engine.predict(moods(&[])).await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_collaborator_uses_stable_fallback() {
        let generator = Arc::new(ScriptedGenerator::unavailable());
        let bundle = engine(generator.clone())
            .generate(moods(&["sad", "sad", "happy"]))
            .await
            .unwrap();

        assert_eq!(generator.calls(), 1);
        assert_eq!(bundle.trend, MoodTrend::Stable);
        assert_eq!(bundle.recommendations, fallback_recommendations(MoodTrend::Stable));
        assert_eq!(bundle.correlations.len(), 4);
        assert!(bundle.correlation_map().values().all(|&r| r == 0.0));
        assert!(bundle.narrative.is_none());
        assert_eq!(bundle.prediction.next_day_mood, "neutral");
        assert_eq!(bundle.prediction.source, PredictionSource::Local);
        assert_eq!(bundle.prediction.confidence, 0.5);
    }

    #[tokio::test]
    async fn test_embedded_json_answer_is_merged() {
        let generator = Arc::new(ScriptedGenerator::replying(PROSE_WRAPPED_REPLY));
        let bundle = engine(generator)
            .generate(moods(&["sad", "sad", "happy"]))
            .await
            .unwrap();

        assert_eq!(bundle.trend, MoodTrend::Improving);
        assert_eq!(bundle.local_trend.trend, MoodTrend::Stable);
        assert_eq!(bundle.prediction.next_day_mood, "happy");
        assert_eq!(bundle.prediction.source, PredictionSource::Collaborator);
        // max(local 0.5, collaborator 0.8)
        assert_eq!(bundle.prediction.confidence, 0.8);
        assert_eq!(bundle.recommendations[0], "Take an evening walk");
        assert_eq!(bundle.recommendations[1], "Keep a gratitude journal");
        assert_recommendation_invariants(&bundle.recommendations);
        assert!(bundle.narrative.as_deref().unwrap().starts_with("Sure!"));
    }

    #[tokio::test]
    async fn test_local_confidence_wins_when_higher() {
        let generator = Arc::new(ScriptedGenerator::replying(
            "{\"prediction_mood\":\"Calm\",\"confidence\":0.2}",
        ));
        let bundle = engine(generator)
            .generate(moods(&["calm"; 8]))
            .await
            .unwrap();

        assert_eq!(bundle.forecast.confidence, REGRESSION_CONFIDENCE_MAX);
        assert_eq!(bundle.prediction.confidence, REGRESSION_CONFIDENCE_MAX);
        assert_eq!(bundle.prediction.next_day_mood, "calm");
        // No recommendations in the answer: the table for the local trend is used
        assert_eq!(bundle.recommendations, fallback_recommendations(MoodTrend::Stable));
    }

    #[tokio::test]
    async fn test_slow_collaborator_times_out() {
        let generator = Arc::new(
            ScriptedGenerator::replying(PROSE_WRAPPED_REPLY).with_delay(Duration::from_secs(5)),
        );
        let config = InsightConfig {
            collaborator_timeout: Duration::from_millis(50),
            ..InsightConfig::default()
        };
        let engine = InsightEngine::new(generator, config);

        let started = std::time::Instant::now();
        let bundle = engine.generate(moods(&["sad", "sad", "happy"])).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(bundle.trend, MoodTrend::Stable);
        assert!(bundle.narrative.is_none());
        assert_eq!(bundle.recommendations, fallback_recommendations(MoodTrend::Stable));
    }

    #[tokio::test]
    async fn test_prose_without_json_falls_back() {
        let generator = Arc::new(ScriptedGenerator::replying(
            "Your mood looks steady. Keep going!",
        ));
        let bundle = engine(generator)
            .generate(moods(&["sad", "calm", "happy", "joyful"]))
            .await
            .unwrap();

        assert!(bundle.narrative.is_none());
        assert_eq!(bundle.prediction.source, PredictionSource::Local);
        assert_recommendation_invariants(&bundle.recommendations);
    }

    #[tokio::test]
    async fn test_unknown_collaborator_trend_is_ignored() {
        let generator = Arc::new(ScriptedGenerator::replying(
            "{\"trend\":\"fantastic\",\"recommendations\":[\"Rest\",\"Rest\"]}",
        ));
        let bundle = engine(generator)
            .generate(moods(&["sad", "sad", "happy"]))
            .await
            .unwrap();

        assert_eq!(bundle.trend, MoodTrend::Stable);
        assert_eq!(bundle.recommendations[0], "Rest");
        assert_recommendation_invariants(&bundle.recommendations);
    }

    #[tokio::test]
    async fn test_strong_correlation_becomes_recommendation() {
        let labels = ["sad", "anxious", "neutral", "calm", "happy"];
        let hours = [5.0, 6.0, 7.0, 9.0, 10.0];
        let mut history = moods(&labels);
        for (i, h) in hours.iter().enumerate() {
            history = history.sleep(day(i as u32 + 1), *h, "good");
        }

        let generator = Arc::new(ScriptedGenerator::failing_with_status(500));
        let bundle = engine(generator).generate(history).await.unwrap();

        assert!(bundle.coefficient("sleep_mood") > 0.95);
        assert!(bundle
            .recommendations
            .iter()
            .any(|r| r.starts_with("Your mood improves with better sleep")));
        assert_recommendation_invariants(&bundle.recommendations);
    }

    #[tokio::test]
    async fn test_prompt_reflects_history() {
        let generator = Arc::new(ScriptedGenerator::unavailable());
        engine(generator.clone())
            .generate(moods(&["sad", "happy"]))
            .await
            .unwrap();

        let request = generator.last_request().unwrap();
        assert!(request.user_prompt.contains("Mood Data: 2 entries"));
        assert!(request.user_prompt.contains("Recent Moods: sad, happy"));
        assert_eq!(request.model_name, "mixtral-8x7b-32768");
    }

    #[tokio::test]
    async fn test_predict_is_local_only() {
        let generator = Arc::new(ScriptedGenerator::replying(PROSE_WRAPPED_REPLY));
        let result = engine(generator.clone())
            .predict(moods(&["calm"; 8]))
            .await
            .unwrap();

        assert_eq!(generator.calls(), 0);
        assert_eq!(result.predicted_mood, Mood::Calm);
        assert_eq!(result.model, ForecastModel::LinearRegressionSlidingWindow);
    }

    #[test]
    fn test_signals_without_collaborator() {
        let generator = Arc::new(ScriptedGenerator::unavailable());
        let engine = engine(generator.clone());
        let history = moods(&["angry", "sad", "neutral", "calm", "happy", "joyful"]);

        let report = engine.signals(&history).unwrap();
        assert_eq!(report.trend.trend, MoodTrend::Improving);
        assert_eq!(report.alignment, CorrelationAlignment::Date);
        assert_eq!(report.correlations.len(), 4);
        assert_eq!(generator.calls(), 0);

        assert!(engine.signals(&moods(&["happy"])).is_err());
    }

    #[test]
    fn test_threshold_is_clamped_on_construction() {
        let config = InsightConfig {
            recommendation_threshold: 0.9,
            ..InsightConfig::default()
        };
        let engine = InsightEngine::new(Arc::new(ScriptedGenerator::unavailable()), config);
        assert_eq!(engine.config().recommendation_threshold, 0.3);
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label(" Happy "), "happy");
        assert_eq!(normalize_label("Content"), "content");
    }
}
