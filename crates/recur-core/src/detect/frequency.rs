//! Cadence classification and confidence scoring

use crate::models::FrequencyLabel;
use crate::policy::DetectionPolicy;

/// Cadence and confidence for a cluster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: FrequencyLabel,
    pub confidence: f64,
}

/// Map an average interval to a cadence label and its base confidence
///
/// Intervals outside every band become "every N days" with the fallback
/// confidence.
pub fn classify_interval(avg_interval_days: f64, policy: &DetectionPolicy) -> (FrequencyLabel, f64) {
    policy
        .bands
        .iter()
        .find(|band| band.contains(avg_interval_days))
        .map(|band| (band.label, band.confidence))
        .unwrap_or_else(|| {
            let days = avg_interval_days.round().max(0.0) as u32;
            (FrequencyLabel::EveryNDays(days), policy.fallback_confidence)
        })
}

/// Confidences are kept to hundredths so equal scores compare equal
const CONFIDENCE_SCALE: f64 = 100.0;

/// Add the sample-count bonuses, snap to hundredths and clamp to [0, 1]
pub fn adjust_confidence(base: f64, sample_count: usize, policy: &DetectionPolicy) -> f64 {
    let bonus = policy
        .sample_bonus_tiers
        .iter()
        .filter(|&&tier| sample_count >= tier)
        .count() as f64
        * policy.sample_bonus;

    (((base + bonus) * CONFIDENCE_SCALE).round() / CONFIDENCE_SCALE).clamp(0.0, 1.0)
}

pub fn classify(avg_interval_days: f64, sample_count: usize, policy: &DetectionPolicy) -> Classification {
    let (label, base) = classify_interval(avg_interval_days, policy);
    Classification {
        label,
        confidence: adjust_confidence(base, sample_count, policy),
    }
}
