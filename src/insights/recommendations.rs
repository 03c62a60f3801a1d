//! Recommendation assembly
//!
//! Builds the final 3-5 item list from the collaborator's suggestions (or
//! the static table for the trend), correlation observations and generic
//! filler.

use crate::analytics::{Correlation, Feature, MoodTrend};

pub const MIN_RECOMMENDATIONS: usize = 3;
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Default |r| above which a correlation becomes a recommendation
pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.3;

/// Allowed range for the correlation threshold
pub const CORRELATION_THRESHOLD_RANGE: (f64, f64) = (0.2, 0.3);

const IMPROVING_FALLBACK: [&str; 3] = [
    "Keep up the habits that have been lifting your mood",
    "Note what went well on your best days so you can repeat it",
    "Continue tracking your wellness journey",
];

const DECLINING_FALLBACK: [&str; 3] = [
    "Prioritize rest and a consistent sleep schedule",
    "Schedule a short focus session or walk when feeling low",
    "Reach out to someone you trust and share how you feel",
];

const STABLE_FALLBACK: [&str; 3] = [
    "Maintain regular sleep patterns",
    "Continue tracking your wellness journey",
    "Practice mindfulness during stressful periods",
];

const FILLER: [&str; 3] = [
    "Consider maintaining a consistent daily routine",
    "Track additional factors that might influence your mood",
    "Celebrate small wins to boost positive emotions",
];

/// Static recommendations used when the collaborator gives none
pub fn fallback_recommendations(trend: MoodTrend) -> Vec<String> {
    let table = match trend {
        MoodTrend::Improving => &IMPROVING_FALLBACK,
        MoodTrend::Declining => &DECLINING_FALLBACK,
        MoodTrend::Stable => &STABLE_FALLBACK,
    };
    table.iter().map(|s| s.to_string()).collect()
}

/// Clamp a configured threshold into the supported range
pub fn clamp_threshold(threshold: f64) -> f64 {
    if threshold.is_finite() {
        threshold.clamp(CORRELATION_THRESHOLD_RANGE.0, CORRELATION_THRESHOLD_RANGE.1)
    } else {
        DEFAULT_CORRELATION_THRESHOLD
    }
}

/// One observation per correlation whose magnitude exceeds `threshold`
pub fn correlation_observations(correlations: &[Correlation], threshold: f64) -> Vec<String> {
    correlations
        .iter()
        .filter(|c| c.coefficient.abs() > threshold)
        .map(describe_correlation)
        .collect()
}

fn describe_correlation(corr: &Correlation) -> String {
    let percent = format!("{:.1}%", corr.coefficient.abs() * 100.0);
    let positive = corr.coefficient > 0.0;

    match (corr.feature_a, positive) {
        (Feature::SleepHours, true) => {
            format!("Your mood improves with better sleep (correlation: {})", percent)
        }
        (Feature::FocusScore, true) => format!("Focus sessions boost your mood by {}", percent),
        (feature, true) => format!(
            "Your mood tends to rise with your {} (correlation: {})",
            feature.describe(),
            percent
        ),
        (feature, false) => format!(
            "Your mood tends to dip as your {} goes up (correlation: -{})",
            feature.describe(),
            percent
        ),
    }
}

/// Merge, de-duplicate, pad and truncate.
///
/// Order is preserved: `base` first, then `observations`, then filler.
/// Blank entries are dropped and duplicates compare after trimming.
pub fn assemble(base: Vec<String>, observations: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(MAX_RECOMMENDATIONS);

    for item in base.into_iter().chain(observations) {
        push_unique(&mut out, item.trim());
    }

    for filler in FILLER {
        if out.len() >= MIN_RECOMMENDATIONS {
            break;
        }
        push_unique(&mut out, filler);
    }

    out.truncate(MAX_RECOMMENDATIONS);
    out
}

fn push_unique(out: &mut Vec<String>, item: &str) {
    if !item.is_empty() && !out.iter().any(|existing| existing == item) {
        out.push(item.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fallback_tables_have_three_entries() {
        for trend in [MoodTrend::Improving, MoodTrend::Declining, MoodTrend::Stable] {
            let recs = fallback_recommendations(trend);
            assert_eq!(recs.len(), 3);
            assert_eq!(assemble(recs.clone(), Vec::new()), recs);
        }
    }

    #[test]
    fn test_assemble_pads_short_lists() {
        let recs = assemble(strings(&["Drink water"]), Vec::new());
        assert_eq!(recs.len(), MIN_RECOMMENDATIONS);
        assert_eq!(recs[0], "Drink water");
        assert_eq!(recs[1], FILLER[0]);
    }

    #[test]
    fn test_assemble_pads_empty_list() {
        let recs = assemble(Vec::new(), Vec::new());
        assert_eq!(recs, strings(&FILLER));
    }

    #[test]
    fn test_assemble_truncates_long_lists() {
        let base = strings(&["a", "b", "c", "d", "e", "f"]);
        let recs = assemble(base, strings(&["g"]));
        assert_eq!(recs, strings(&["a", "b", "c", "d", "e"]));
    }

    #[test]
    fn test_assemble_removes_duplicates_before_padding() {
        let base = strings(&["Rest", " Rest ", "", FILLER[0]]);
        let recs = assemble(base, strings(&["Rest"]));

        assert_eq!(recs, strings(&["Rest", FILLER[0], FILLER[1]]));
    }

    #[test]
    fn test_assemble_invariants_hold() {
        let cases = vec![
            (vec![], vec![]),
            (strings(&["x"; 10]), vec![]),
            (strings(&["a", "b"]), strings(&["b", "c", "d", "e", "f"])),
            (strings(&FILLER), strings(&FILLER)),
        ];
        for (base, observations) in cases {
            let recs = assemble(base, observations);
            assert!((MIN_RECOMMENDATIONS..=MAX_RECOMMENDATIONS).contains(&recs.len()));
            let mut unique = recs.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), recs.len());
        }
    }

    #[test]
    fn test_correlation_observations() {
        let correlations = vec![
            Correlation::new(Feature::SleepHours, Feature::Mood, 0.72, 10),
            Correlation::new(Feature::FocusScore, Feature::Mood, 0.25, 10),
            Correlation::new(Feature::Xp, Feature::Mood, -0.5, 10),
        ];

        let observations = correlation_observations(&correlations, 0.3);
        assert_eq!(
            observations,
            vec![
                "Your mood improves with better sleep (correlation: 72.0%)".to_string(),
                "Your mood tends to dip as your earned XP goes up (correlation: -50.0%)".to_string(),
            ]
        );

        let observations = correlation_observations(&correlations, 0.2);
        assert_eq!(observations[1], "Focus sessions boost your mood by 25.0%");
    }

    #[test]
    fn test_clamp_threshold() {
        assert_eq!(clamp_threshold(0.1), 0.2);
        assert_eq!(clamp_threshold(0.25), 0.25);
        assert_eq!(clamp_threshold(0.9), 0.3);
        assert_eq!(clamp_threshold(f64::NAN), DEFAULT_CORRELATION_THRESHOLD);
    }
}
