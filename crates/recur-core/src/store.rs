//! Storage collaborators for the detector
//!
//! - `TransactionSource` supplies a user's transaction snapshot
//! - `PatternStore` persists detected patterns keyed by `(user, merchant_key)`
//!
//! [`crate::db::Database`] implements both against SQLite. [`InMemoryStore`]
//! is a process-local double for tests and one-off runs.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::Result;
use crate::models::{RecurringPattern, TransactionRecord};

/// Supplies the transactions detection runs over
pub trait TransactionSource: Send + Sync {
    /// All stored transactions for a user
    fn load_transactions(&self, user: &str) -> Result<Vec<TransactionRecord>>;
}

/// Persists detected patterns
pub trait PatternStore: Send + Sync {
    /// Insert or replace patterns by merchant key, atomically
    ///
    /// Returns the number of patterns written. Re-running with the same
    /// patterns never creates duplicates.
    fn upsert_patterns(&self, user: &str, patterns: &[RecurringPattern]) -> Result<usize>;

    /// A user's patterns, highest confidence first
    fn list_patterns(&self, user: &str) -> Result<Vec<RecurringPattern>>;
}

/// Mutex-guarded maps standing in for the database
#[derive(Debug, Default)]
pub struct InMemoryStore {
    transactions: Mutex<HashMap<String, Vec<TransactionRecord>>>,
    patterns: Mutex<HashMap<String, Vec<RecurringPattern>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append transactions for a user
    pub fn add_transactions(&self, user: &str, records: impl IntoIterator<Item = TransactionRecord>) {
        lock(&self.transactions)
            .entry(user.to_string())
            .or_default()
            .extend(records);
    }
}

// A poisoned lock still holds consistent data; every write here is a single push or replace.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TransactionSource for InMemoryStore {
    fn load_transactions(&self, user: &str) -> Result<Vec<TransactionRecord>> {
        Ok(lock(&self.transactions)
            .get(user)
            .cloned()
            .unwrap_or_default())
    }
}

impl PatternStore for InMemoryStore {
    fn upsert_patterns(&self, user: &str, patterns: &[RecurringPattern]) -> Result<usize> {
        let mut all = lock(&self.patterns);
        let stored = all.entry(user.to_string()).or_default();

        for pattern in patterns {
            match stored
                .iter_mut()
                .find(|p| p.merchant_key == pattern.merchant_key)
            {
                Some(existing) => *existing = pattern.clone(),
                None => stored.push(pattern.clone()),
            }
        }

        Ok(patterns.len())
    }

    fn list_patterns(&self, user: &str) -> Result<Vec<RecurringPattern>> {
        let mut patterns = lock(&self.patterns).get(user).cloned().unwrap_or_default();
        patterns.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.merchant_key.cmp(&b.merchant_key))
        });
        Ok(patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FrequencyLabel;
    use chrono::NaiveDate;

    fn pattern(key: &str, confidence: f64, amount: f64) -> RecurringPattern {
        let last = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        RecurringPattern {
            merchant_key: key.to_string(),
            category: None,
            avg_amount: amount,
            frequency_label: FrequencyLabel::Monthly,
            confidence,
            sample_count: 3,
            avg_interval_days: 30.0,
            std_dev_days: 0.5,
            last_transaction_date: last,
            next_due_date: last + chrono::Duration::days(30),
            is_subscription: true,
        }
    }

    #[test]
    fn test_upsert_replaces_by_merchant() {
        let store = InMemoryStore::new();
        store
            .upsert_patterns("alice", &[pattern("Netflix", 0.8, 15.49)])
            .unwrap();
        store
            .upsert_patterns("alice", &[pattern("Netflix", 0.9, 17.99)])
            .unwrap();

        let stored = store.list_patterns("alice").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].avg_amount, 17.99);
    }

    #[test]
    fn test_patterns_are_per_user() {
        let store = InMemoryStore::new();
        store
            .upsert_patterns("alice", &[pattern("Netflix", 0.8, 15.49)])
            .unwrap();

        assert!(store.list_patterns("bob").unwrap().is_empty());
        assert_eq!(store.list_patterns("alice").unwrap().len(), 1);
    }

    #[test]
    fn test_list_orders_by_confidence() {
        let store = InMemoryStore::new();
        store
            .upsert_patterns(
                "alice",
                &[
                    pattern("Water", 0.6, 30.0),
                    pattern("Spotify", 0.9, 9.99),
                    pattern("Gym", 0.9, 40.0),
                ],
            )
            .unwrap();

        let keys: Vec<_> = store
            .list_patterns("alice")
            .unwrap()
            .into_iter()
            .map(|p| p.merchant_key)
            .collect();
        assert_eq!(keys, vec!["Gym", "Spotify", "Water"]);
    }

    #[test]
    fn test_transactions_round_trip() {
        let store = InMemoryStore::new();
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        store.add_transactions("alice", vec![TransactionRecord::new("Gym", 40.0, ts)]);

        assert_eq!(store.load_transactions("alice").unwrap().len(), 1);
        assert!(store.load_transactions("bob").unwrap().is_empty());
    }
}
