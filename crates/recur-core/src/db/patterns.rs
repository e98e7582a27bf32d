//! Recurring pattern persistence

use rusqlite::{params, Row};
use rusqlite::types::Type;
use tracing::debug;

use super::{date_column, Database, DATE_FORMAT};
use crate::error::Result;
use crate::models::{FrequencyLabel, RecurringPattern};
use crate::store::PatternStore;

const PATTERN_COLUMNS: &str = "merchant_key, category, avg_amount, frequency_label, confidence, \
     sample_count, avg_interval_days, std_dev_days, last_transaction_date, next_due_date, \
     is_subscription";

fn row_to_pattern(row: &Row) -> rusqlite::Result<RecurringPattern> {
    let label: String = row.get(3)?;
    let frequency_label = label.parse::<FrequencyLabel>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::from(e))
    })?;
    let last: String = row.get(8)?;
    let next: String = row.get(9)?;
    let sample_count: i64 = row.get(5)?;

    Ok(RecurringPattern {
        merchant_key: row.get(0)?,
        category: row.get(1)?,
        avg_amount: row.get(2)?,
        frequency_label,
        confidence: row.get(4)?,
        sample_count: sample_count.max(0) as usize,
        avg_interval_days: row.get(6)?,
        std_dev_days: row.get(7)?,
        last_transaction_date: date_column(8, &last)?,
        next_due_date: date_column(9, &next)?,
        is_subscription: row.get(10)?,
    })
}

impl Database {
    /// Upsert patterns by `(user, merchant_key)` in one SQLite transaction
    pub fn save_patterns(&self, user: &str, patterns: &[RecurringPattern]) -> Result<usize> {
        let mut conn = self.conn()?;
        let db_tx = conn.transaction()?;

        {
            let mut stmt = db_tx.prepare(
                r#"
                INSERT INTO recurring_patterns (
                    user_id, merchant_key, category, avg_amount, frequency_label, confidence,
                    sample_count, avg_interval_days, std_dev_days, last_transaction_date,
                    next_due_date, is_subscription
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(user_id, merchant_key) DO UPDATE SET
                    category = excluded.category,
                    avg_amount = excluded.avg_amount,
                    frequency_label = excluded.frequency_label,
                    confidence = excluded.confidence,
                    sample_count = excluded.sample_count,
                    avg_interval_days = excluded.avg_interval_days,
                    std_dev_days = excluded.std_dev_days,
                    last_transaction_date = excluded.last_transaction_date,
                    next_due_date = excluded.next_due_date,
                    is_subscription = excluded.is_subscription,
                    updated_at = CURRENT_TIMESTAMP
                "#,
            )?;

            for p in patterns {
                stmt.execute(params![
                    user,
                    p.merchant_key,
                    p.category,
                    p.avg_amount,
                    p.frequency_label.to_string(),
                    p.confidence,
                    p.sample_count as i64,
                    p.avg_interval_days,
                    p.std_dev_days,
                    p.last_transaction_date.format(DATE_FORMAT).to_string(),
                    p.next_due_date.format(DATE_FORMAT).to_string(),
                    p.is_subscription,
                ])?;
            }
        }

        db_tx.commit()?;
        debug!(user, saved = patterns.len(), "Saved recurring patterns");
        Ok(patterns.len())
    }

    /// A user's patterns, highest confidence first
    pub fn list_patterns(&self, user: &str) -> Result<Vec<RecurringPattern>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM recurring_patterns WHERE user_id = ? \
             ORDER BY confidence DESC, merchant_key",
            PATTERN_COLUMNS
        ))?;

        let patterns = stmt
            .query_map(params![user], row_to_pattern)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(patterns)
    }

    /// Look up one pattern by merchant
    pub fn get_pattern(&self, user: &str, merchant_key: &str) -> Result<Option<RecurringPattern>> {
        use rusqlite::OptionalExtension;

        let conn = self.conn()?;
        let pattern = conn
            .query_row(
                &format!(
                    "SELECT {} FROM recurring_patterns WHERE user_id = ? AND merchant_key = ?",
                    PATTERN_COLUMNS
                ),
                params![user, merchant_key],
                row_to_pattern,
            )
            .optional()?;

        Ok(pattern)
    }
}

impl PatternStore for Database {
    fn upsert_patterns(&self, user: &str, patterns: &[RecurringPattern]) -> Result<usize> {
        self.save_patterns(user, patterns)
    }

    fn list_patterns(&self, user: &str) -> Result<Vec<RecurringPattern>> {
        Database::list_patterns(self, user)
    }
}
