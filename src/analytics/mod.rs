//! Wellness Analytics
//!
//! The local, deterministic half of the insight pipeline.
//!
//! ## Architecture
//!
//! - **Scoring**: total label -> score lookups with neutral defaults
//! - **FeatureTable**: one filled row per date across all sources
//! - **CorrelationEngine**: Pearson coefficients between feature pairs
//! - **TrendAnalysis**: improving / declining / stable classification
//! - **Forecaster**: next-day mood from a sliding-window regression
//!   (or the seeded heuristic blend)
//!
//! Every component is a pure function of the history passed in; nothing is
//! cached between requests.

mod correlations;
mod features;
mod forecast;
mod regression;
mod scoring;
mod trend;
mod types;

pub use correlations::{
    correlation_map, pearson_correlation, Correlation, CorrelationAlignment, CorrelationEngine,
    STANDARD_PAIRS,
};
pub use features::{DailyRecord, Feature, FeatureSeries, FeatureTable};
pub use forecast::{
    build_windows, flatten_window, ForecastModel, ForecastResult, ForecastStrategy, Forecaster,
    HeuristicForecaster, RegressionForecaster, DEGENERATE_FIT_CONFIDENCE,
    HEURISTIC_CONFIDENCE_MAX, HEURISTIC_CONFIDENCE_MIN, INSUFFICIENT_DATA_CONFIDENCE,
    REGRESSION_CONFIDENCE_MAX, REGRESSION_CONFIDENCE_MIN, WINDOW_SIZE,
};
pub use regression::{FitError, LinearModel, StandardScaler};
pub use scoring::{mood_score, sleep_quality_score, Mood, SleepQuality};
pub use trend::{classify_trend, linear_slope, mean, MoodTrend, TrendAnalysis};
pub use types::{parse_date, FocusEntry, MoodEntry, SleepEntry, WellnessHistory, XpEntry};
