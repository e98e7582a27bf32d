//! Recurring transaction detection
//!
//! A pure batch transform over a snapshot of transactions:
//! 1. Group by merchant key
//! 2. Cluster each group by amount
//! 3. Measure spacing and reject irregular clusters
//! 4. Classify cadence and score confidence
//! 5. Build patterns, highest confidence first
//!
//! Nothing here touches storage. Persisting the result is the caller's job
//! (see [`crate::refresh`]).

pub mod cluster;
pub mod frequency;
pub mod group;
pub mod interval;
pub mod pattern;

use tracing::{debug, info};

use crate::models::{RecurringPattern, TransactionRecord};
use crate::policy::DetectionPolicy;

pub use cluster::{cluster_amounts, relative_difference};
pub use frequency::{classify, Classification};
pub use group::{group_by_merchant, MerchantGroup};
pub use interval::{analyze_intervals, IntervalStats};
pub use pattern::{build_pattern, sort_by_confidence};

/// Runs the detection pipeline under a policy
#[derive(Debug, Clone, Default)]
pub struct RecurringDetector {
    policy: DetectionPolicy,
}

impl RecurringDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DetectionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &DetectionPolicy {
        &self.policy
    }

    /// Detect recurring patterns in a transaction snapshot
    ///
    /// Empty or single-element input yields an empty list.
    pub fn detect(&self, transactions: &[TransactionRecord]) -> Vec<RecurringPattern> {
        let groups = group_by_merchant(transactions);
        let mut patterns = Vec::new();
        let mut clusters_seen = 0;

        for group in &groups {
            for mut cluster in cluster_amounts(group, &self.policy) {
                clusters_seen += 1;

                let Some(stats) = analyze_intervals(&mut cluster, &self.policy) else {
                    continue;
                };

                let classification =
                    classify(stats.avg_interval_days, cluster.members.len(), &self.policy);

                debug!(
                    merchant = group.merchant_key,
                    frequency = %classification.label,
                    confidence = classification.confidence,
                    samples = cluster.members.len(),
                    "Accepted recurring cluster"
                );

                patterns.push(build_pattern(
                    group.merchant_key,
                    &cluster,
                    &stats,
                    classification,
                ));
            }
        }

        sort_by_confidence(&mut patterns);

        info!(
            transactions = transactions.len(),
            merchants = groups.len(),
            clusters = clusters_seen,
            patterns = patterns.len(),
            "Recurring detection complete"
        );

        patterns
    }
}

/// Detect with the default policy
pub fn detect_recurring(transactions: &[TransactionRecord]) -> Vec<RecurringPattern> {
    RecurringDetector::new().detect(transactions)
}
