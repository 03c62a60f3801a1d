//! Wellness history types
//!
//! Caller-supplied per-date records. Every request carries its own full
//! history; nothing here is retained between calls.
//!
//! Dates are read leniently: a plain `YYYY-MM-DD`, an RFC 3339 timestamp or a
//! naive datetime all reduce to the calendar date they name. They are always
//! written back as `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// A single mood check-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodEntry {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    /// Mood label, e.g. "happy" (scored via [`crate::analytics::mood_score`])
    pub emotion: String,
    /// Self-reported intensity, 1-10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u8>,
    /// Optional client-side timestamp, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// One night of sleep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepEntry {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    pub hours: f64,
    /// "poor", "fair", "good" or "excellent"
    pub quality: String,
}

/// One day of focus sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusEntry {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    pub score: f64,
    /// Total focused minutes, rounded when sent as a fraction
    #[serde(deserialize_with = "deserialize_rounded")]
    pub duration: i64,
}

/// Experience points earned on a date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpEntry {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(deserialize_with = "deserialize_rounded")]
    pub xp: i64,
}

/// Everything the engine needs for one request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellnessHistory {
    /// Missing is the same as empty; the engine rejects fewer than 2 entries
    #[serde(default)]
    pub mood_data: Vec<MoodEntry>,
    #[serde(default)]
    pub sleep_data: Vec<SleepEntry>,
    #[serde(default)]
    pub focus_data: Vec<FocusEntry>,
    #[serde(default)]
    pub xp_data: Vec<XpEntry>,
}

impl WellnessHistory {
    /// History with mood check-ins only
    pub fn from_moods<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, S)>,
        S: Into<String>,
    {
        Self {
            mood_data: entries
                .into_iter()
                .map(|(date, emotion)| MoodEntry {
                    date,
                    emotion: emotion.into(),
                    intensity: None,
                    timestamp: None,
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Builder: add a sleep record
    pub fn sleep(mut self, date: NaiveDate, hours: f64, quality: impl Into<String>) -> Self {
        self.sleep_data.push(SleepEntry {
            date,
            hours,
            quality: quality.into(),
        });
        self
    }

    /// Builder: add a focus record
    pub fn focus(mut self, date: NaiveDate, score: f64, duration: i64) -> Self {
        self.focus_data.push(FocusEntry {
            date,
            score,
            duration,
        });
        self
    }

    /// Builder: add an XP record
    pub fn xp(mut self, date: NaiveDate, xp: i64) -> Self {
        self.xp_data.push(XpEntry { date, xp });
        self
    }
}

/// Calendar date named by `raw`, ignoring any time of day.
///
/// Timestamps with an offset keep the date in that offset.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|timestamp| timestamp.date())
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| D::Error::custom(format!("unrecognized date: {:?}", raw)))
}

/// Whole number from an integer or floating-point JSON number
fn deserialize_rounded<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(D::Error::custom("expected a finite number"));
    }
    Ok(raw.round() as i64)
}
