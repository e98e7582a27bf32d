//! Database tests

use chrono::Timelike;

use super::*;
use crate::import::prepare_transaction;
use crate::models::*;
use crate::store::{PatternStore, TransactionSource};

fn input(merchant: &str, amount: f64, occurred_at: &str) -> TransactionInput {
    TransactionInput {
        merchant: Some(merchant.to_string()),
        description: None,
        amount,
        occurred_at: occurred_at.to_string(),
        category: Some("Subscriptions".to_string()),
    }
}

fn pattern(key: &str, label: FrequencyLabel, confidence: f64) -> RecurringPattern {
    let last = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    RecurringPattern {
        merchant_key: key.to_string(),
        category: Some("Entertainment".to_string()),
        avg_amount: 15.49,
        frequency_label: label,
        confidence,
        sample_count: 4,
        avg_interval_days: 30.25,
        std_dev_days: 0.83,
        last_transaction_date: last,
        next_due_date: last + chrono::Duration::days(30),
        is_subscription: true,
    }
}

#[test]
fn test_in_memory_db() {
    let db = Database::in_memory().unwrap();
    assert_eq!(db.count_transactions("default").unwrap(), 0);
    assert!(db.list_patterns("default").unwrap().is_empty());
}

#[test]
fn test_migrations_are_rerunnable() {
    let db = Database::in_memory().unwrap();
    let reopened = Database::new(db.path()).unwrap();
    assert_eq!(reopened.count_transactions("default").unwrap(), 0);
}

#[test]
fn test_insert_skips_duplicates() {
    let db = Database::in_memory().unwrap();
    let tx = prepare_transaction("alice", &input("Spotify", 9.99, "2024-01-01")).unwrap();

    let first = db.insert_transaction("alice", &tx).unwrap();
    let TransactionInsertResult::Inserted(id) = first else {
        panic!("expected insert, got {:?}", first);
    };
    assert_eq!(
        db.insert_transaction("alice", &tx).unwrap(),
        TransactionInsertResult::Duplicate(id)
    );
    assert_eq!(db.count_transactions("alice").unwrap(), 1);
}

#[test]
fn test_batch_insert_summary() {
    let db = Database::in_memory().unwrap();
    let txs: Vec<_> = [
        input("Spotify", 9.99, "2024-01-01"),
        input("Spotify", 9.99, "2024-02-01"),
        input("Spotify", 9.99, "2024-01-01"),
    ]
    .iter()
    .map(|i| prepare_transaction("alice", i).unwrap())
    .collect();

    let summary = db.insert_transactions("alice", &txs).unwrap();
    assert_eq!(
        summary,
        InsertSummary {
            inserted: 2,
            duplicates: 1
        }
    );
}

#[test]
fn test_transactions_round_trip_with_null_timestamp() {
    let db = Database::in_memory().unwrap();
    let txs = vec![
        prepare_transaction("alice", &input("Gym", 40.0, "2024-01-05 07:30:00")).unwrap(),
        prepare_transaction("alice", &input("Gym", 40.0, "someday")).unwrap(),
    ];
    db.insert_transactions("alice", &txs).unwrap();

    let loaded = db.load_transactions("alice").unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0], txs[0].record);
    assert!(loaded[1].occurred_at.is_none());
    assert_eq!(loaded[1].category.as_deref(), Some("Subscriptions"));

    assert!(db.load_transactions("bob").unwrap().is_empty());
}

#[test]
fn test_transactions_keep_fractional_seconds() {
    let db = Database::in_memory().unwrap();
    let txs = vec![
        prepare_transaction("alice", &input("Gym", 40.0, "2024-01-05T07:30:00.250")).unwrap(),
        prepare_transaction("alice", &input("Gym", 40.0, "2024-01-12T07:30:00")).unwrap(),
    ];
    db.insert_transactions("alice", &txs).unwrap();

    let loaded = db.load_transactions("alice").unwrap();
    assert_eq!(loaded[0].occurred_at, txs[0].record.occurred_at);
    assert_eq!(loaded[1].occurred_at, txs[1].record.occurred_at);
    assert_eq!(loaded[0].occurred_at.unwrap().nanosecond(), 250_000_000);
}

#[test]
fn test_stored_detection_matches_direct_detection() {
    let db = Database::in_memory().unwrap();
    let txs: Vec<_> = [
        "2024-01-01T08:00:00.500",
        "2024-01-31T08:00:00.125",
        "2024-03-01T20:15:30.750",
    ]
    .iter()
    .map(|ts| prepare_transaction("alice", &input("Spotify", 9.99, ts)).unwrap())
    .collect();
    db.insert_transactions("alice", &txs).unwrap();

    let direct: Vec<_> = txs.iter().map(|t| t.record.clone()).collect();
    let stored = db.load_transactions("alice").unwrap();
    assert_eq!(
        crate::detect::detect_recurring(&stored),
        crate::detect::detect_recurring(&direct)
    );
}

#[test]
fn test_patterns_not_in_batch_are_kept() {
    let db = Database::in_memory().unwrap();
    db.save_patterns(
        "alice",
        &[
            pattern("Netflix", FrequencyLabel::Monthly, 0.8),
            pattern("Gym", FrequencyLabel::Weekly, 0.8),
        ],
    )
    .unwrap();

    db.save_patterns("alice", &[pattern("Netflix", FrequencyLabel::Monthly, 0.9)])
        .unwrap();

    let gym = db.get_pattern("alice", "Gym").unwrap();
    assert_eq!(gym, Some(pattern("Gym", FrequencyLabel::Weekly, 0.8)));
    assert_eq!(db.list_patterns("alice").unwrap().len(), 2);
}

#[test]
fn test_patterns_upsert_by_merchant() {
    let db = Database::in_memory().unwrap();
    db.upsert_patterns("alice", &[pattern("Netflix", FrequencyLabel::Monthly, 0.8)])
        .unwrap();

    let mut updated = pattern("Netflix", FrequencyLabel::Monthly, 0.9);
    updated.avg_amount = 17.99;
    db.upsert_patterns("alice", &[updated.clone()]).unwrap();

    let stored = PatternStore::list_patterns(&db, "alice").unwrap();
    assert_eq!(stored, vec![updated]);
}

#[test]
fn test_patterns_round_trip_every_label() {
    let db = Database::in_memory().unwrap();
    let patterns = vec![
        pattern("A", FrequencyLabel::Weekly, 0.9),
        pattern("B", FrequencyLabel::BiWeekly, 0.8),
        pattern("C", FrequencyLabel::EveryNDays(45), 0.7),
        pattern("D", FrequencyLabel::Yearly, 0.6),
    ];
    assert_eq!(db.save_patterns("alice", &patterns).unwrap(), 4);

    assert_eq!(db.list_patterns("alice").unwrap(), patterns);
    assert_eq!(
        db.get_pattern("alice", "C").unwrap().map(|p| p.frequency_label),
        Some(FrequencyLabel::EveryNDays(45))
    );
    assert!(db.get_pattern("bob", "C").unwrap().is_none());
}

#[test]
fn test_patterns_scoped_per_user() {
    let db = Database::in_memory().unwrap();
    db.save_patterns("alice", &[pattern("Netflix", FrequencyLabel::Monthly, 0.8)])
        .unwrap();
    db.save_patterns("bob", &[pattern("Netflix", FrequencyLabel::Monthly, 0.7)])
        .unwrap();

    assert_eq!(db.list_patterns("alice").unwrap()[0].confidence, 0.8);
    assert_eq!(db.list_patterns("bob").unwrap()[0].confidence, 0.7);
}
