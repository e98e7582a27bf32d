//! Refresh a user's persisted patterns from their stored transactions

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::detect::RecurringDetector;
use crate::error::Result;
use crate::models::RecurringPattern;
use crate::store::{PatternStore, TransactionSource};

/// Outcome of one refresh
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub transactions_scanned: usize,
    pub patterns_found: usize,
    pub patterns_saved: usize,
    /// True when transactions could not be loaded and detection was skipped
    pub skipped: bool,
}

/// Keep the first pattern per merchant key
///
/// Input is confidence-sorted, so each merchant keeps its strongest pattern.
pub fn one_per_merchant(patterns: Vec<RecurringPattern>) -> Vec<RecurringPattern> {
    let mut seen = HashSet::new();
    patterns
        .into_iter()
        .filter(|p| seen.insert(p.merchant_key.clone()))
        .collect()
}

/// Load, detect and upsert for one user
///
/// A load failure means "no data available": it is logged and the refresh
/// is skipped. Failures while saving propagate.
pub fn refresh_patterns<S, P>(
    source: &S,
    store: &P,
    detector: &RecurringDetector,
    user: &str,
) -> Result<RefreshSummary>
where
    S: TransactionSource + ?Sized,
    P: PatternStore + ?Sized,
{
    let transactions = match source.load_transactions(user) {
        Ok(txs) => txs,
        Err(e) => {
            warn!(user, error = %e, "Could not load transactions, skipping refresh");
            return Ok(RefreshSummary {
                skipped: true,
                ..Default::default()
            });
        }
    };

    let patterns = detector.detect(&transactions);
    let patterns_found = patterns.len();
    let to_save = one_per_merchant(patterns);
    let patterns_saved = store.upsert_patterns(user, &to_save)?;

    info!(
        user,
        scanned = transactions.len(),
        found = patterns_found,
        saved = patterns_saved,
        "Refreshed recurring patterns"
    );

    Ok(RefreshSummary {
        transactions_scanned: transactions.len(),
        patterns_found,
        patterns_saved,
        skipped: false,
    })
}
