//! Pattern assembly from accepted clusters

use chrono::Duration;

use crate::models::{AmountCluster, RecurringPattern};

use super::frequency::Classification;
use super::interval::IntervalStats;

/// Materialize an accepted cluster
pub fn build_pattern(
    merchant_key: &str,
    cluster: &AmountCluster,
    stats: &IntervalStats,
    classification: Classification,
) -> RecurringPattern {
    let step = Duration::days(stats.avg_interval_days.round() as i64);

    RecurringPattern {
        merchant_key: merchant_key.to_string(),
        category: cluster.category.clone(),
        avg_amount: cluster.representative_amount,
        frequency_label: classification.label,
        confidence: classification.confidence,
        sample_count: cluster.members.len(),
        avg_interval_days: stats.avg_interval_days,
        std_dev_days: stats.std_dev_days,
        last_transaction_date: stats.last_transaction_date,
        next_due_date: stats.last_transaction_date + step,
        is_subscription: true,
    }
}

/// Order by confidence, highest first
///
/// The sort is stable, so equal confidences keep discovery order.
pub fn sort_by_confidence(patterns: &mut [RecurringPattern]) {
    patterns.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
}
