//! Interval analysis: spacing between a cluster's transactions

use chrono::NaiveDate;
use tracing::debug;

use crate::models::AmountCluster;
use crate::policy::DetectionPolicy;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Spacing statistics for a chronologically sorted cluster
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalStats {
    /// Gaps between consecutive transactions, in fractional days
    pub gaps: Vec<f64>,
    pub avg_interval_days: f64,
    /// Population standard deviation of `gaps`
    pub std_dev_days: f64,
    pub last_transaction_date: NaiveDate,
}

impl IntervalStats {
    /// Whether spacing is regular enough to call the cluster recurring
    pub fn is_consistent(&self, ratio: f64) -> bool {
        self.std_dev_days <= ratio * self.avg_interval_days
    }
}

/// Mean and population standard deviation
pub fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Sort a cluster by time and measure its spacing
///
/// Members without a parsed timestamp are dropped first; the cluster's
/// category is then taken from its latest member. Returns `None` when too few
/// dated members remain, when every member falls on the same instant, or when
/// spacing is too irregular for the policy.
pub fn analyze_intervals(
    cluster: &mut AmountCluster,
    policy: &DetectionPolicy,
) -> Option<IntervalStats> {
    cluster.members.retain(|m| m.occurred_at.is_some());
    if cluster.members.len() < policy.min_samples {
        debug!(
            amount = cluster.representative_amount,
            dated = cluster.members.len(),
            "Too few dated transactions after dropping unparseable timestamps"
        );
        return None;
    }

    cluster.members.sort_by_key(|m| m.occurred_at);
    let timestamps: Vec<_> = cluster.members.iter().filter_map(|m| m.occurred_at).collect();
    let last = *timestamps.last()?;
    cluster.category = cluster.members.last().and_then(|m| m.category.clone());

    let gaps: Vec<f64> = timestamps
        .windows(2)
        .map(|w| (w[1] - w[0]).num_seconds() as f64 / SECONDS_PER_DAY)
        .collect();
    let (avg_interval_days, std_dev_days) = mean_and_std_dev(&gaps);

    if avg_interval_days <= 0.0 {
        debug!(
            amount = cluster.representative_amount,
            "All transactions share one timestamp"
        );
        return None;
    }

    let stats = IntervalStats {
        gaps,
        avg_interval_days,
        std_dev_days,
        last_transaction_date: last.date(),
    };

    if !stats.is_consistent(policy.interval_consistency_ratio) {
        debug!(
            amount = cluster.representative_amount,
            avg = stats.avg_interval_days,
            std_dev = stats.std_dev_days,
            "Rejected cluster with irregular spacing"
        );
        return None;
    }

    Some(stats)
}
