//! Trend Classifier
//!
//! Labels a chronological mood sequence as improving, declining or stable
//! from the recent-vs-earlier average and the least-squares slope.

use serde::{Deserialize, Serialize};

/// Number of most recent points averaged as "recent"
pub const RECENT_WINDOW: usize = 3;

/// Minimum |slope| (score per entry) for a non-stable trend
pub const SLOPE_THRESHOLD: f64 = 0.3;

/// Minimum gap between recent and earlier averages for a non-stable trend
pub const AVERAGE_MARGIN: f64 = 0.5;

/// Direction of mood over the supplied history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodTrend {
    Improving,
    Declining,
    Stable,
}

impl MoodTrend {
    pub fn as_str(self) -> &'static str {
        match self {
            MoodTrend::Improving => "improving",
            MoodTrend::Declining => "declining",
            MoodTrend::Stable => "stable",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "improving" => Some(MoodTrend::Improving),
            "declining" => Some(MoodTrend::Declining),
            "stable" => Some(MoodTrend::Stable),
            _ => None,
        }
    }
}

impl std::fmt::Display for MoodTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trend label plus the statistics it was derived from
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub trend: MoodTrend,
    pub recent_avg: f64,
    pub earlier_avg: f64,
    pub slope: f64,
}

impl TrendAnalysis {
    /// Classify chronologically ordered mood scores.
    ///
    /// Fewer than three points is always stable. With exactly three points
    /// there is no earlier segment, so the earlier average is the overall
    /// average and the margin test cannot pass.
    pub fn analyze(scores: &[f64]) -> Self {
        let overall = mean(scores);
        if scores.len() < RECENT_WINDOW {
            return Self {
                trend: MoodTrend::Stable,
                recent_avg: overall,
                earlier_avg: overall,
                slope: linear_slope(scores),
            };
        }

        let split = scores.len() - RECENT_WINDOW;
        let recent_avg = mean(&scores[split..]);
        let earlier_avg = if split == 0 {
            overall
        } else {
            mean(&scores[..split])
        };
        let slope = linear_slope(scores);

        let trend = if slope > SLOPE_THRESHOLD && recent_avg > earlier_avg + AVERAGE_MARGIN {
            MoodTrend::Improving
        } else if slope < -SLOPE_THRESHOLD && recent_avg < earlier_avg - AVERAGE_MARGIN {
            MoodTrend::Declining
        } else {
            MoodTrend::Stable
        };

        Self {
            trend,
            recent_avg,
            earlier_avg,
            slope,
        }
    }
}

/// Shorthand for [`TrendAnalysis::analyze`]
pub fn classify_trend(scores: &[f64]) -> MoodTrend {
    TrendAnalysis::analyze(scores).trend
}

/// Least-squares slope of `values` against their index (0 for < 2 points)
pub fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let mean_x = (n - 1) as f64 / 2.0;
    let mean_y = mean(values);

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }

    let slope = num / den;
    if slope.is_finite() {
        slope
    } else {
        0.0
    }
}

/// Arithmetic mean (0 for an empty slice)
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
