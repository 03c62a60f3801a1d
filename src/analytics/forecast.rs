//! Forecast Model
//!
//! Predicts the next day's mood from the request's own history. The model
//! is refit on every call and never outlives it.
//!
//! Two strategies:
//! - **Regression** (default, deterministic): sliding windows of
//!   [`WINDOW_SIZE`] days, standardized, fit by least squares. Confidence is
//!   the training R², kept within [0.5, 0.9].
//! - **Heuristic** (non-deterministic unless seeded): recent average plus a
//!   trend adjustment plus volatility-scaled noise. Confidence blends trend
//!   consistency and data volume, kept within [0.3, 0.95].

use crate::analytics::features::{DailyRecord, Feature, FeatureTable};
use crate::analytics::regression::{LinearModel, StandardScaler};
use crate::analytics::scoring::{clamp_mood_score, Mood, NEUTRAL_MOOD_SCORE};
use crate::analytics::trend::{linear_slope, mean, RECENT_WINDOW};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Consecutive days flattened into one training example
pub const WINDOW_SIZE: usize = 3;

/// Per-day features in a window, in flattening order
pub const WINDOW_FEATURES: [Feature; 4] = [
    Feature::Mood,
    Feature::SleepHours,
    Feature::SleepQuality,
    Feature::FocusScore,
];

pub const REGRESSION_CONFIDENCE_MIN: f64 = 0.5;
pub const REGRESSION_CONFIDENCE_MAX: f64 = 0.9;
pub const HEURISTIC_CONFIDENCE_MIN: f64 = 0.3;
pub const HEURISTIC_CONFIDENCE_MAX: f64 = 0.95;

/// Confidence reported when there is too little history to fit
pub const INSUFFICIENT_DATA_CONFIDENCE: f64 = 0.5;

/// Confidence reported when the fit is numerically degenerate
pub const DEGENERATE_FIT_CONFIDENCE: f64 = 0.6;

/// Days of history used to measure volatility
const VOLATILITY_WINDOW: usize = 5;

/// Noise standard deviation per unit of volatility
const NOISE_SCALE: f64 = 0.25;

/// History length at which data volume stops limiting confidence
const ADEQUATE_POINTS: f64 = 10.0;

/// Blend weight on the change between the last three days and the three before
const SHORT_TERM_WEIGHT: f64 = 0.2;

/// Blend weight on the whole-series slope
const SLOPE_WEIGHT: f64 = 0.5;

/// Which forecaster to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastStrategy {
    #[default]
    Regression,
    Heuristic,
}

impl std::str::FromStr for ForecastStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regression" => Ok(ForecastStrategy::Regression),
            "heuristic" => Ok(ForecastStrategy::Heuristic),
            other => Err(format!("unknown forecast strategy: {}", other)),
        }
    }
}

/// Model that produced a forecast; reported with every prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastModel {
    LinearRegressionSlidingWindow,
    HeuristicBlend,
}

impl ForecastModel {
    pub fn as_str(self) -> &'static str {
        match self {
            ForecastModel::LinearRegressionSlidingWindow => "linear_regression_sliding_window",
            ForecastModel::HeuristicBlend => "heuristic_blend",
        }
    }

    /// Whether repeated calls on the same history can differ
    pub fn is_deterministic(self) -> bool {
        matches!(self, ForecastModel::LinearRegressionSlidingWindow)
    }
}

/// Next-day mood estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Predicted score, clamped to [1, 10]
    pub predicted_score: f64,
    pub predicted_mood: Mood,
    pub confidence: f64,
    pub model: ForecastModel,
    /// True when the model could not be used and a fixed value was reported
    pub fallback: bool,
}

impl ForecastResult {
    /// Fixed neutral forecast used when the model cannot run
    pub fn fallback(model: ForecastModel, confidence: f64) -> Self {
        Self {
            predicted_score: NEUTRAL_MOOD_SCORE as f64,
            predicted_mood: Mood::Neutral,
            confidence,
            model,
            fallback: true,
        }
    }

    fn from_score(model: ForecastModel, score: f64, confidence: f64) -> Self {
        let predicted_score = clamp_mood_score(score);
        Self {
            predicted_score,
            predicted_mood: Mood::from_score(predicted_score),
            confidence,
            model,
            fallback: false,
        }
    }
}

/// Flatten consecutive records into one feature vector
pub fn flatten_window(records: &[DailyRecord]) -> Vec<f64> {
    records
        .iter()
        .flat_map(|r| WINDOW_FEATURES.iter().map(move |&f| r.value(f)))
        .collect()
}

/// Training examples: every window of `size` days, labelled with the mood
/// of the day right after it
pub fn build_windows(table: &FeatureTable, size: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let records = table.records();
    if size == 0 || records.len() <= size {
        return (Vec::new(), Vec::new());
    }

    (size..records.len())
        .map(|i| {
            (
                flatten_window(&records[i - size..i]),
                records[i].mood_score as f64,
            )
        })
        .unzip()
}

/// Forecaster selected by configuration
#[derive(Debug, Clone)]
pub enum Forecaster {
    Regression(RegressionForecaster),
    Heuristic(HeuristicForecaster),
}

impl Forecaster {
    pub fn new(strategy: ForecastStrategy, seed: Option<u64>) -> Self {
        match strategy {
            ForecastStrategy::Regression => Forecaster::Regression(RegressionForecaster::default()),
            ForecastStrategy::Heuristic => Forecaster::Heuristic(HeuristicForecaster { seed }),
        }
    }

    pub fn model(&self) -> ForecastModel {
        match self {
            Forecaster::Regression(_) => ForecastModel::LinearRegressionSlidingWindow,
            Forecaster::Heuristic(_) => ForecastModel::HeuristicBlend,
        }
    }

    pub fn forecast(&self, table: &FeatureTable) -> ForecastResult {
        match self {
            Forecaster::Regression(f) => f.forecast(table),
            Forecaster::Heuristic(f) => f.forecast(table),
        }
    }
}

impl Default for Forecaster {
    fn default() -> Self {
        Forecaster::Regression(RegressionForecaster::default())
    }
}

/// Sliding-window least-squares forecaster
#[derive(Debug, Clone)]
pub struct RegressionForecaster {
    window_size: usize,
}

impl Default for RegressionForecaster {
    fn default() -> Self {
        Self {
            window_size: WINDOW_SIZE,
        }
    }
}

impl RegressionForecaster {
    pub fn forecast(&self, table: &FeatureTable) -> ForecastResult {
        let model_kind = ForecastModel::LinearRegressionSlidingWindow;
        let (x, y) = build_windows(table, self.window_size);

        if x.len() < 2 {
            tracing::debug!(
                days = table.len(),
                examples = x.len(),
                "Not enough history for regression forecast"
            );
            return ForecastResult::fallback(model_kind, INSUFFICIENT_DATA_CONFIDENCE);
        }

        let (scaler, x_scaled) = StandardScaler::fit_transform(&x);
        let model = match LinearModel::fit(&x_scaled, &y) {
            Ok(model) => model,
            Err(e) => {
                tracing::warn!(error = %e, examples = x.len(), "Regression fit failed, using fallback");
                return ForecastResult::fallback(model_kind, DEGENERATE_FIT_CONFIDENCE);
            }
        };

        let records = table.records();
        let latest = flatten_window(&records[records.len() - self.window_size..]);
        let predicted = model.predict(&scaler.transform(&latest));
        let r_squared = model.r_squared(&x_scaled, &y);

        if !predicted.is_finite() || !r_squared.is_finite() {
            tracing::warn!(predicted, r_squared, "Regression produced non-finite output");
            return ForecastResult::fallback(model_kind, DEGENERATE_FIT_CONFIDENCE);
        }

        tracing::debug!(
            examples = x.len(),
            predicted,
            r_squared,
            "Regression forecast computed"
        );

        ForecastResult::from_score(
            model_kind,
            predicted,
            r_squared.clamp(REGRESSION_CONFIDENCE_MIN, REGRESSION_CONFIDENCE_MAX),
        )
    }
}

/// Recent-average + trend + noise forecaster
#[derive(Debug, Clone, Default)]
pub struct HeuristicForecaster {
    /// Fixed seed for reproducible noise; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl HeuristicForecaster {
    pub fn forecast(&self, table: &FeatureTable) -> ForecastResult {
        let model_kind = ForecastModel::HeuristicBlend;
        let scores = table.column(Feature::Mood);
        let n = scores.len();

        if n < 2 {
            return ForecastResult::fallback(model_kind, INSUFFICIENT_DATA_CONFIDENCE);
        }

        let recent_start = n.saturating_sub(RECENT_WINDOW);
        let recent_avg = mean(&scores[recent_start..]);

        let previous = &scores[recent_start.saturating_sub(RECENT_WINDOW)..recent_start];
        let short_delta = if previous.is_empty() {
            0.0
        } else {
            recent_avg - mean(previous)
        };
        let slope = linear_slope(&scores);
        let adjustment =
            (SHORT_TERM_WEIGHT * short_delta + SLOPE_WEIGHT * slope) * intensity_factor(table);

        let volatility = std_dev(&scores[n.saturating_sub(VOLATILITY_WINDOW)..]);
        let noise = if volatility > 0.0 {
            let mut rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            Normal::new(0.0, volatility * NOISE_SCALE)
                .map(|normal| normal.sample(&mut rng))
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let consistency = 1.0 / (1.0 + volatility);
        let adequacy = (n as f64 / ADEQUATE_POINTS).min(1.0);
        let confidence = (0.5 * consistency + 0.5 * adequacy)
            .clamp(HEURISTIC_CONFIDENCE_MIN, HEURISTIC_CONFIDENCE_MAX);

        tracing::debug!(
            recent_avg,
            short_delta,
            slope,
            volatility,
            noise,
            "Heuristic forecast computed"
        );

        ForecastResult::from_score(model_kind, recent_avg + adjustment + noise, confidence)
    }
}

/// Scale for the trend adjustment from recently reported intensities.
///
/// Average intensity 5 is neutral (factor 1); the factor stays in [0.5, 1.5].
fn intensity_factor(table: &FeatureTable) -> f64 {
    let recent: Vec<f64> = table
        .records()
        .iter()
        .rev()
        .take(RECENT_WINDOW)
        .filter_map(|r| r.mood_intensity.map(f64::from))
        .collect();

    if recent.is_empty() {
        1.0
    } else {
        (mean(&recent) / 5.0).clamp(0.5, 1.5)
    }
}

/// Population standard deviation
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}
