//! Feature Scoring
//!
//! Total label -> score lookups for the categorical inputs. Unknown labels
//! never fail; they degrade to the neutral default of their scale.

use serde::{Deserialize, Serialize};

/// Score used for any mood label outside the known vocabulary
pub const NEUTRAL_MOOD_SCORE: u8 = 5;

/// Score used for any sleep-quality label outside the known vocabulary
pub const DEFAULT_SLEEP_QUALITY_SCORE: u8 = 2;

/// Lowest and highest mood score
pub const MOOD_SCORE_MIN: f64 = 1.0;
pub const MOOD_SCORE_MAX: f64 = 10.0;

/// Known self-reported moods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Angry,
    Sad,
    Anxious,
    Neutral,
    Calm,
    Happy,
    Excited,
    Joyful,
}

impl Mood {
    /// Parse a label case-insensitively
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "angry" => Some(Mood::Angry),
            "sad" => Some(Mood::Sad),
            "anxious" => Some(Mood::Anxious),
            "neutral" => Some(Mood::Neutral),
            "calm" => Some(Mood::Calm),
            "happy" => Some(Mood::Happy),
            "excited" => Some(Mood::Excited),
            "joyful" => Some(Mood::Joyful),
            _ => None,
        }
    }

    /// Score on the 1-10 scale
    pub fn score(self) -> u8 {
        match self {
            Mood::Angry => 2,
            Mood::Sad => 3,
            Mood::Anxious => 4,
            Mood::Neutral => 5,
            Mood::Calm => 7,
            Mood::Happy => 8,
            Mood::Excited | Mood::Joyful => 9,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Angry => "angry",
            Mood::Sad => "sad",
            Mood::Anxious => "anxious",
            Mood::Neutral => "neutral",
            Mood::Calm => "calm",
            Mood::Happy => "happy",
            Mood::Excited => "excited",
            Mood::Joyful => "joyful",
        }
    }

    /// Map a (possibly fractional) score back to a label.
    ///
    /// Bands are exhaustive and monotonic: >=8 happy, >=7 calm, >=5 neutral,
    /// >=4 anxious, anything lower sad. Non-finite scores read as neutral.
    pub fn from_score(score: f64) -> Self {
        if !score.is_finite() {
            return Mood::Neutral;
        }
        if score >= 8.0 {
            Mood::Happy
        } else if score >= 7.0 {
            Mood::Calm
        } else if score >= 5.0 {
            Mood::Neutral
        } else if score >= 4.0 {
            Mood::Anxious
        } else {
            Mood::Sad
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Self-reported sleep quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl SleepQuality {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "poor" => Some(SleepQuality::Poor),
            "fair" => Some(SleepQuality::Fair),
            "good" => Some(SleepQuality::Good),
            "excellent" => Some(SleepQuality::Excellent),
            _ => None,
        }
    }

    /// Score on the 1-4 scale
    pub fn score(self) -> u8 {
        match self {
            SleepQuality::Poor => 1,
            SleepQuality::Fair => 2,
            SleepQuality::Good => 3,
            SleepQuality::Excellent => 4,
        }
    }
}

/// Mood label to score; unknown labels are neutral
pub fn mood_score(label: &str) -> u8 {
    Mood::parse(label).map_or(NEUTRAL_MOOD_SCORE, Mood::score)
}

/// Sleep-quality label to score; unknown labels are fair
pub fn sleep_quality_score(label: &str) -> u8 {
    SleepQuality::parse(label).map_or(DEFAULT_SLEEP_QUALITY_SCORE, SleepQuality::score)
}

/// Clamp a mood score to the 1-10 domain
pub fn clamp_mood_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(MOOD_SCORE_MIN, MOOD_SCORE_MAX)
    } else {
        NEUTRAL_MOOD_SCORE as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_mood_scores() {
        assert_eq!(mood_score("angry"), 2);
        assert_eq!(mood_score("sad"), 3);
        assert_eq!(mood_score("anxious"), 4);
        assert_eq!(mood_score("neutral"), 5);
        assert_eq!(mood_score("calm"), 7);
        assert_eq!(mood_score("happy"), 8);
        assert_eq!(mood_score("excited"), 9);
        assert_eq!(mood_score("joyful"), 9);
    }

    #[test]
    fn test_mood_score_is_case_insensitive() {
        assert_eq!(mood_score("HAPPY"), 8);
        assert_eq!(mood_score("  Calm "), 7);
    }

    #[test]
    fn test_unknown_labels_use_defaults() {
        assert_eq!(mood_score("melancholic"), NEUTRAL_MOOD_SCORE);
        assert_eq!(mood_score(""), NEUTRAL_MOOD_SCORE);
        assert_eq!(sleep_quality_score("restless"), DEFAULT_SLEEP_QUALITY_SCORE);
    }

    #[test]
    fn test_sleep_quality_scores() {
        assert_eq!(sleep_quality_score("poor"), 1);
        assert_eq!(sleep_quality_score("Fair"), 2);
        assert_eq!(sleep_quality_score("good"), 3);
        assert_eq!(sleep_quality_score("EXCELLENT"), 4);
    }

    #[test]
    fn test_score_bands() {
        assert_eq!(Mood::from_score(10.0), Mood::Happy);
        assert_eq!(Mood::from_score(8.0), Mood::Happy);
        assert_eq!(Mood::from_score(7.99), Mood::Calm);
        assert_eq!(Mood::from_score(7.0), Mood::Calm);
        assert_eq!(Mood::from_score(5.0), Mood::Neutral);
        assert_eq!(Mood::from_score(4.5), Mood::Anxious);
        assert_eq!(Mood::from_score(3.99), Mood::Sad);
        assert_eq!(Mood::from_score(1.0), Mood::Sad);
        assert_eq!(Mood::from_score(f64::NAN), Mood::Neutral);
    }

    #[test]
    fn test_clamp_mood_score() {
        assert_eq!(clamp_mood_score(12.3), 10.0);
        assert_eq!(clamp_mood_score(-4.0), 1.0);
        assert_eq!(clamp_mood_score(6.5), 6.5);
        assert_eq!(clamp_mood_score(f64::INFINITY), 5.0);
    }
}
