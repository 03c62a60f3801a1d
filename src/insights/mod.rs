//! Insight Arbiter
//!
//! Validates a history, asks the text-generation collaborator for its
//! opinion while the local analytics run, and merges the two into one
//! [`InsightBundle`].
//!
//! ## Merge policy
//!
//! - trend: the collaborator's, if it named a valid one, else local
//! - predicted mood: the collaborator's, if present, else the local forecast
//! - confidence: max(local, collaborator)
//! - recommendations: collaborator's list (or the static table for the
//!   trend), plus correlation observations, de-duplicated, padded to 3 and
//!   truncated to 5

mod engine;
mod prompt;
mod recommendations;

pub use engine::{
    InsightBundle, InsightConfig, InsightEngine, InsightError, Prediction, PredictionSource,
    SignalReport, MIN_MOOD_ENTRIES,
};
pub use prompt::{build_request, summarize, PromptSettings, SYSTEM_INSTRUCTION};
pub use recommendations::{
    assemble, clamp_threshold, correlation_observations, fallback_recommendations,
    DEFAULT_CORRELATION_THRESHOLD, MAX_RECOMMENDATIONS, MIN_RECOMMENDATIONS,
};
