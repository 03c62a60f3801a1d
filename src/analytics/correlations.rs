//! Correlation Engine
//!
//! Pearson correlation between feature series. The coefficient is always
//! defined: degenerate input (too short, constant, numerically unstable)
//! yields 0.

use crate::analytics::features::{Feature, FeatureSeries};
use crate::analytics::types::WellnessHistory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Feature pairs reported for every request, as (feature, against)
pub const STANDARD_PAIRS: [(Feature, Feature); 4] = [
    (Feature::SleepHours, Feature::Mood),
    (Feature::FocusScore, Feature::Mood),
    (Feature::SleepQuality, Feature::Mood),
    (Feature::Xp, Feature::Mood),
];

/// How two series are paired up before correlating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationAlignment {
    /// Pair values recorded on the same calendar date
    #[default]
    Date,
    /// Pair values by index in the caller's order, truncated to the shorter series
    Position,
}

impl std::str::FromStr for CorrelationAlignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(CorrelationAlignment::Date),
            "position" => Ok(CorrelationAlignment::Position),
            other => Err(format!("unknown correlation alignment: {}", other)),
        }
    }
}

/// A correlation between two features
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    pub feature_a: Feature,
    pub feature_b: Feature,
    /// Pearson correlation coefficient (-1 to 1, never NaN)
    pub coefficient: f64,
    /// Human-readable strength: "strong", "moderate", "weak", "negligible"
    pub strength: String,
    /// "positive", "negative" or "none"
    pub direction: String,
    /// Number of paired samples used
    pub sample_size: usize,
}

impl Correlation {
    pub fn new(feature_a: Feature, feature_b: Feature, coefficient: f64, sample_size: usize) -> Self {
        Self {
            feature_a,
            feature_b,
            coefficient,
            strength: correlation_strength(coefficient),
            direction: if coefficient > 0.0 {
                "positive".to_string()
            } else if coefficient < 0.0 {
                "negative".to_string()
            } else {
                "none".to_string()
            },
            sample_size,
        }
    }

    /// Pair name used in responses, e.g. "sleep_mood"
    pub fn key(&self) -> String {
        format!("{}_{}", self.feature_a.key(), self.feature_b.key())
    }
}

/// Calculate correlations between features of one history
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationEngine {
    alignment: CorrelationAlignment,
}

impl CorrelationEngine {
    pub fn new(alignment: CorrelationAlignment) -> Self {
        Self { alignment }
    }

    pub fn alignment(&self) -> CorrelationAlignment {
        self.alignment
    }

    /// Correlate two raw series under the configured alignment
    pub fn correlate(&self, a: &FeatureSeries, b: &FeatureSeries) -> Correlation {
        let (xs, ys) = match self.alignment {
            CorrelationAlignment::Date => align_by_date(&a.points, &b.points),
            CorrelationAlignment::Position => {
                let n = a.len().min(b.len());
                (a.values()[..n].to_vec(), b.values()[..n].to_vec())
            }
        };

        let r = pearson_correlation(&xs, &ys);
        Correlation::new(a.feature, b.feature, r, xs.len())
    }

    /// Correlations for every standard pair, in [`STANDARD_PAIRS`] order
    pub fn calculate_all(&self, history: &WellnessHistory) -> Vec<Correlation> {
        STANDARD_PAIRS
            .iter()
            .map(|&(a, b)| {
                let corr = self.correlate(
                    &FeatureSeries::from_history(history, a),
                    &FeatureSeries::from_history(history, b),
                );
                tracing::debug!(
                    pair = %corr.key(),
                    r = corr.coefficient,
                    samples = corr.sample_size,
                    "Calculated correlation"
                );
                corr
            })
            .collect()
    }
}

/// Pair name -> coefficient
pub fn correlation_map(correlations: &[Correlation]) -> BTreeMap<String, f64> {
    correlations
        .iter()
        .map(|c| (c.key(), c.coefficient))
        .collect()
}

/// Pair values recorded on the same date, in date order.
///
/// A date repeated within one series keeps its later value.
fn align_by_date(a: &[(NaiveDate, f64)], b: &[(NaiveDate, f64)]) -> (Vec<f64>, Vec<f64>) {
    let a_map: BTreeMap<NaiveDate, f64> = a.iter().copied().collect();
    let b_map: BTreeMap<NaiveDate, f64> = b.iter().copied().collect();

    a_map
        .iter()
        .filter_map(|(date, &av)| b_map.get(date).map(|&bv| (av, bv)))
        .unzip()
}

/// Calculate Pearson correlation coefficient
///
/// Series are truncated to the shorter length. Returns 0 when fewer than
/// two samples remain, when either series is constant, or when the result
/// is not finite. Otherwise the result lies in [-1, 1].
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let (x, y) = (&x[..n], &y[..n]);

    if is_constant(x) || is_constant(y) {
        return 0.0;
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    let r = cov / denominator;
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

/// Convert correlation coefficient to human-readable strength
fn correlation_strength(r: f64) -> String {
    let abs_r = r.abs();
    if abs_r > 0.7 {
        "strong".to_string()
    } else if abs_r > 0.5 {
        "moderate".to_string()
    } else if abs_r > 0.3 {
        "weak".to_string()
    } else {
        "negligible".to_string()
    }
}
