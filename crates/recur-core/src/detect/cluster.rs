//! Amount clustering within a merchant group
//!
//! The default strategy is a single greedy first-fit pass: each transaction joins
//! the first cluster whose representative amount is within tolerance, or opens a
//! new cluster as its representative. Order matters. A price that drifts a few
//! percent at a time can end up split across clusters, or kept together while the
//! first and last amounts are far apart under `Centroid`.

use tracing::debug;

use crate::models::{AmountCluster, TransactionRecord};
use crate::policy::{ClusterStrategy, DetectionPolicy};

use super::group::MerchantGroup;

/// Relative difference of `amount` from `reference`
pub fn relative_difference(amount: f64, reference: f64) -> f64 {
    (amount - reference).abs() / reference
}

/// Split a merchant group into clusters of similar amount
///
/// Non-positive (or non-finite) amounts are excluded. Clusters with fewer
/// than `policy.min_samples` members are discarded.
pub fn cluster_amounts(group: &MerchantGroup<'_>, policy: &DetectionPolicy) -> Vec<AmountCluster> {
    let mut clusters: Vec<AmountCluster> = Vec::new();

    for tx in &group.transactions {
        if !(tx.amount.is_finite() && tx.amount > 0.0) {
            debug!(
                merchant = group.merchant_key,
                amount = tx.amount,
                "Excluding transaction with non-positive amount"
            );
            continue;
        }

        let slot = clusters.iter().position(|c| {
            relative_difference(tx.amount, c.representative_amount) <= policy.amount_tolerance
        });

        match slot {
            Some(i) => {
                let cluster = &mut clusters[i];
                cluster.members.push((*tx).clone());
                cluster.category = tx.category.clone();
                if policy.cluster_strategy == ClusterStrategy::Centroid {
                    cluster.representative_amount = mean_amount(&cluster.members);
                }
            }
            None => clusters.push(open_cluster(tx)),
        }
    }

    let before = clusters.len();
    clusters.retain(|c| c.members.len() >= policy.min_samples);

    if clusters.len() < before {
        debug!(
            merchant = group.merchant_key,
            discarded = before - clusters.len(),
            kept = clusters.len(),
            "Discarded undersized amount clusters"
        );
    }

    clusters
}

fn open_cluster(tx: &TransactionRecord) -> AmountCluster {
    AmountCluster {
        representative_amount: tx.amount,
        members: vec![tx.clone()],
        category: tx.category.clone(),
    }
}

fn mean_amount(members: &[TransactionRecord]) -> f64 {
    members.iter().map(|t| t.amount).sum::<f64>() / members.len() as f64
}
