//! Feature Table
//!
//! Merges mood, sleep, focus and XP records into one row per calendar date.
//! A feature missing on a date is forward-filled from the nearest earlier
//! date, then back-filled from the nearest later one. A feature with no
//! value on any date takes its default.

use crate::analytics::scoring::{
    mood_score, sleep_quality_score, DEFAULT_SLEEP_QUALITY_SCORE, NEUTRAL_MOOD_SCORE,
};
use crate::analytics::types::WellnessHistory;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_SLEEP_HOURS: f64 = 7.0;
pub const DEFAULT_FOCUS_SCORE: f64 = 5.0;

/// A numeric feature column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Mood,
    SleepHours,
    SleepQuality,
    FocusScore,
    FocusDuration,
    Xp,
}

impl Feature {
    /// Short key used in correlation pair names ("sleep_mood")
    pub fn key(self) -> &'static str {
        match self {
            Feature::Mood => "mood",
            Feature::SleepHours => "sleep",
            Feature::SleepQuality => "sleep_quality",
            Feature::FocusScore => "focus",
            Feature::FocusDuration => "focus_duration",
            Feature::Xp => "xp",
        }
    }

    /// Human-readable name for recommendation text
    pub fn describe(self) -> &'static str {
        match self {
            Feature::Mood => "mood",
            Feature::SleepHours => "sleep duration",
            Feature::SleepQuality => "sleep quality",
            Feature::FocusScore => "focus",
            Feature::FocusDuration => "focus time",
            Feature::Xp => "earned XP",
        }
    }
}

/// One merged, fully-filled day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub mood_score: u8,
    pub mood_label: String,
    /// Intensity reported on this exact date (never filled)
    pub mood_intensity: Option<u8>,
    pub sleep_hours: f64,
    pub sleep_quality_score: u8,
    pub focus_score: f64,
    pub focus_duration_minutes: i64,
    pub xp: i64,
}

impl DailyRecord {
    pub fn value(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Mood => self.mood_score as f64,
            Feature::SleepHours => self.sleep_hours,
            Feature::SleepQuality => self.sleep_quality_score as f64,
            Feature::FocusScore => self.focus_score,
            Feature::FocusDuration => self.focus_duration_minutes as f64,
            Feature::Xp => self.xp as f64,
        }
    }
}

/// Raw (unfilled) values of one feature as supplied, with their dates
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSeries {
    pub feature: Feature,
    pub points: Vec<(NaiveDate, f64)>,
}

impl FeatureSeries {
    /// Extract a feature in the caller's order
    pub fn from_history(history: &WellnessHistory, feature: Feature) -> Self {
        let points = match feature {
            Feature::Mood => history
                .mood_data
                .iter()
                .map(|m| (m.date, mood_score(&m.emotion) as f64))
                .collect(),
            Feature::SleepHours => history
                .sleep_data
                .iter()
                .map(|s| (s.date, s.hours.max(0.0)))
                .collect(),
            Feature::SleepQuality => history
                .sleep_data
                .iter()
                .map(|s| (s.date, sleep_quality_score(&s.quality) as f64))
                .collect(),
            Feature::FocusScore => history
                .focus_data
                .iter()
                .map(|f| (f.date, f.score))
                .collect(),
            Feature::FocusDuration => history
                .focus_data
                .iter()
                .map(|f| (f.date, f.duration as f64))
                .collect(),
            Feature::Xp => history.xp_data.iter().map(|x| (x.date, x.xp as f64)).collect(),
        };

        Self { feature, points }
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    /// Values sorted by date, one per date (a repeated date keeps its later value)
    pub fn chronological(&self) -> Vec<f64> {
        self.points
            .iter()
            .copied()
            .collect::<BTreeMap<NaiveDate, f64>>()
            .into_values()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Default)]
struct PartialDay {
    mood: Option<(u8, String)>,
    intensity: Option<u8>,
    sleep: Option<(f64, u8)>,
    focus: Option<(f64, i64)>,
    xp: Option<i64>,
}

/// Per-date feature table, ordered by date
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureTable {
    records: Vec<DailyRecord>,
}

impl FeatureTable {
    /// Merge all sources of a history keyed on date.
    ///
    /// When a source repeats a date, the later entry wins.
    pub fn build(history: &WellnessHistory) -> Self {
        let mut days: BTreeMap<NaiveDate, PartialDay> = BTreeMap::new();

        for m in &history.mood_data {
            let day = days.entry(m.date).or_default();
            day.mood = Some((mood_score(&m.emotion), m.emotion.trim().to_lowercase()));
            day.intensity = m.intensity.map(|i| i.clamp(1, 10));
        }
        for s in &history.sleep_data {
            days.entry(s.date).or_default().sleep =
                Some((s.hours.max(0.0), sleep_quality_score(&s.quality)));
        }
        for f in &history.focus_data {
            days.entry(f.date).or_default().focus = Some((f.score, f.duration));
        }
        for x in &history.xp_data {
            days.entry(x.date).or_default().xp = Some(x.xp);
        }

        let dates: Vec<NaiveDate> = days.keys().copied().collect();
        let intensities: Vec<Option<u8>> = days.values().map(|d| d.intensity).collect();
        let moods = fill(
            days.values().map(|d| d.mood.clone()).collect(),
            (NEUTRAL_MOOD_SCORE, "neutral".to_string()),
        );
        let sleeps = fill(
            days.values().map(|d| d.sleep).collect(),
            (DEFAULT_SLEEP_HOURS, DEFAULT_SLEEP_QUALITY_SCORE),
        );
        let focuses = fill(
            days.values().map(|d| d.focus).collect(),
            (DEFAULT_FOCUS_SCORE, 0),
        );
        let xps = fill(days.values().map(|d| d.xp).collect(), 0);

        let records = dates
            .into_iter()
            .enumerate()
            .map(|(i, date)| {
                let (mood_score, mood_label) = moods[i].clone();
                let (sleep_hours, sleep_quality_score) = sleeps[i];
                let (focus_score, focus_duration_minutes) = focuses[i];
                DailyRecord {
                    date,
                    mood_score,
                    mood_label,
                    mood_intensity: intensities[i],
                    sleep_hours,
                    sleep_quality_score,
                    focus_score,
                    focus_duration_minutes,
                    xp: xps[i],
                }
            })
            .collect();

        Self { records }
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Filled values of one feature, in date order
    pub fn column(&self, feature: Feature) -> Vec<f64> {
        self.records.iter().map(|r| r.value(feature)).collect()
    }

    /// Filled mood labels, in date order
    pub fn mood_labels(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.mood_label.as_str()).collect()
    }
}

/// Forward-fill, then back-fill, then default.
fn fill<T: Clone>(column: Vec<Option<T>>, default: T) -> Vec<T> {
    let mut forward: Vec<Option<T>> = Vec::with_capacity(column.len());
    let mut last: Option<T> = None;
    for value in column {
        if value.is_some() {
            last = value;
        }
        forward.push(last.clone());
    }

    let mut next: Option<T> = None;
    for slot in forward.iter_mut().rev() {
        match slot {
            Some(v) => next = Some(v.clone()),
            None => *slot = next.clone(),
        }
    }

    forward
        .into_iter()
        .map(|v| v.unwrap_or_else(|| default.clone()))
        .collect()
}
