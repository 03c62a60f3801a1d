//! # Moodline
//!
//! Wellness-signal analytics: turns a caller-supplied history of mood, sleep,
//! focus and XP records into correlations, a mood trend, a next-day mood
//! forecast and a set of recommendations, optionally enriched by an external
//! text-generation service.
//!
//! ## Features
//!
//! - **Total scoring**: unknown labels degrade to neutral defaults, never errors
//! - **Correlations**: Pearson coefficients that are always defined
//! - **Forecasting**: sliding-window least squares refit on every request
//! - **Arbitration**: the collaborator runs concurrently with local analysis
//!   and every collaborator failure falls back to local results
//! - **Stateless**: nothing is retained between requests
//!
//! ## Modules
//!
//! - [`analytics`]: scoring, feature table, correlations, trend, forecast
//! - [`collaborator`]: chat completions client and JSON extraction
//! - [`insights`]: the insight arbiter
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use moodline::analytics::WellnessHistory;
//! use moodline::collaborator::ScriptedGenerator;
//! use moodline::insights::{InsightConfig, InsightEngine};
//! use chrono::NaiveDate;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = InsightEngine::new(
//!         Arc::new(ScriptedGenerator::unavailable()),
//!         InsightConfig::default(),
//!     );
//!
//!     let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//!     let history = WellnessHistory::from_moods([(day(1), "sad"), (day(2), "calm"), (day(3), "happy")])
//!         .sleep(day(1), 5.5, "poor")
//!         .sleep(day(2), 7.0, "good");
//!
//!     let bundle = engine.generate(history).await?;
//!     println!("{} -> {}", bundle.trend, bundle.prediction.next_day_mood);
//!     for rec in &bundle.recommendations {
//!         println!("- {}", rec);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod collaborator;
pub mod config;
pub mod insights;

// Re-export top-level types for convenience
pub use analytics::{
    Correlation, CorrelationAlignment, CorrelationEngine, FeatureTable, ForecastModel,
    ForecastResult, ForecastStrategy, Forecaster, Mood, MoodTrend, TrendAnalysis,
    WellnessHistory,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use collaborator::{
    ChatCompletionsClient, CollaboratorConfig, CollaboratorError, CompletionRequest,
    TextGenerator,
};

pub use insights::{InsightBundle, InsightConfig, InsightEngine, InsightError};

pub use config::{
    ApiConfig, CollaboratorSettings, Config, ConfigError, EngineConfig, LoggingConfig,
};
