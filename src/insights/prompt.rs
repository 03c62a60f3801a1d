//! Collaborator prompt
//!
//! Summarizes a history as plain text for the text-generation service and
//! asks for a strict JSON answer.

use crate::analytics::{mean, Feature, FeatureSeries, MoodTrend, WellnessHistory};
use crate::collaborator::CompletionRequest;
use std::fmt::Write;

pub const SYSTEM_INSTRUCTION: &str =
    "You are a wellness data analyst. Provide insights in JSON format.";

/// Number of trailing mood labels quoted in the summary
const RECENT_LABELS: usize = 5;

/// Generation parameters passed through to the collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            model: "mixtral-8x7b-32768".to_string(),
            temperature: 0.3,
            max_tokens: 1000,
        }
    }
}

/// Plain-text description of one history
pub fn summarize(history: &WellnessHistory, trend: MoodTrend) -> String {
    let mut out = String::new();

    let mood = FeatureSeries::from_history(history, Feature::Mood);
    let mut dated: Vec<_> = history.mood_data.iter().collect();
    dated.sort_by_key(|m| m.date);
    let recent: Vec<&str> = dated[dated.len().saturating_sub(RECENT_LABELS)..]
        .iter()
        .map(|m| m.emotion.as_str())
        .collect();

    let _ = writeln!(out, "Mood Data: {} entries", history.mood_data.len());
    let _ = writeln!(out, "Average Mood Score: {:.1}/10", mean(&mood.values()));
    let _ = writeln!(out, "Mood Trend: {}", trend);
    let _ = writeln!(out, "Recent Moods: {}", recent.join(", "));

    let sleep = FeatureSeries::from_history(history, Feature::SleepHours);
    let _ = writeln!(out, "Sleep Data: {} entries", sleep.len());
    if !sleep.is_empty() {
        let _ = writeln!(out, "Average Sleep: {:.1} hours", mean(&sleep.values()));
    }

    let focus = FeatureSeries::from_history(history, Feature::FocusScore);
    let _ = writeln!(out, "Focus Data: {} entries", focus.len());
    if !focus.is_empty() {
        let _ = writeln!(out, "Average Focus Score: {:.1}", mean(&focus.values()));
    }

    let total_xp: i64 = history.xp_data.iter().map(|x| x.xp).sum();
    let _ = writeln!(out, "XP Data: {} entries", history.xp_data.len());
    let _ = write!(out, "Total XP: {}", total_xp);

    out
}

/// Full completion request for one history
pub fn build_request(
    history: &WellnessHistory,
    trend: MoodTrend,
    settings: &PromptSettings,
) -> CompletionRequest {
    let user_prompt = format!(
        "Analyze this wellness data and provide insights:\n\n{}\n\n\
         Respond with a single JSON object with these keys:\n\
         - \"trend\": one of \"improving\", \"declining\", \"stable\"\n\
         - \"patterns\": list of short observations\n\
         - \"recommendations\": list of 3-5 specific, actionable suggestions\n\
         - \"prediction_mood\": the most likely mood tomorrow (one word)\n\
         - \"confidence\": number between 0 and 1\n\
         Return only the JSON object.",
        summarize(history, trend)
    );

    CompletionRequest {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        user_prompt,
        model_name: settings.model.clone(),
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
    }
}
