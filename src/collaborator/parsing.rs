//! JSON parsing helpers for collaborator completions
//!
//! Models often wrap the requested JSON in prose ("Sure! {...} Hope this
//! helps!"). The object is located by its first `{` and last `}` and parsed
//! leniently: wrongly-typed fields are dropped rather than failing the whole
//! response.

use super::client::CollaboratorError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Longest raw excerpt carried in parse errors
const ERROR_EXCERPT_LEN: usize = 200;

/// Structured opinion extracted from a completion
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollaboratorInsights {
    pub trend: Option<String>,
    pub patterns: Vec<String>,
    pub recommendations: Vec<String>,
    pub prediction_mood: Option<String>,
    /// Normalized to [0, 1]
    pub confidence: Option<f64>,
}

/// Slice out the outermost JSON object candidate, if any
pub fn extract_json_object(response: &str) -> Option<&str> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => Some(&response[s..=e]),
        _ => None,
    }
}

/// Parse a completion into [`CollaboratorInsights`]
pub fn parse_insights(response: &str) -> Result<CollaboratorInsights, CollaboratorError> {
    let json_str = extract_json_object(response).ok_or(CollaboratorError::NoJson)?;

    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| CollaboratorError::InvalidJson(format!("{} | Raw: {}", e, excerpt(json_str))))?;

    let object = value
        .as_object()
        .ok_or_else(|| CollaboratorError::InvalidJson("top-level value is not an object".into()))?;

    Ok(CollaboratorInsights {
        trend: non_empty_string(object.get("trend")),
        patterns: string_list(object.get("patterns")),
        recommendations: string_list(object.get("recommendations")),
        prediction_mood: non_empty_string(object.get("prediction_mood")),
        confidence: confidence(object),
    })
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| non_empty_string(Some(item)))
            .collect(),
        // A single string is treated as a one-item list
        Some(Value::String(_)) => non_empty_string(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Read `confidence` (or `prediction_confidence`) as a number or numeric
/// string. Values above 1 are read as percentages.
fn confidence(object: &Map<String, Value>) -> Option<f64> {
    let raw = object
        .get("confidence")
        .or_else(|| object.get("prediction_confidence"))?;

    let number = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }?;

    if !number.is_finite() || number < 0.0 {
        return None;
    }
    let normalized = if number > 1.0 { number / 100.0 } else { number };
    Some(normalized.min(1.0))
}

fn excerpt(s: &str) -> String {
    if s.len() > ERROR_EXCERPT_LEN {
        let mut cut = ERROR_EXCERPT_LEN;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &s[..cut])
    } else {
        s.to_string()
    }
}
