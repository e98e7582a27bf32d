//! Transaction operations

use rusqlite::{params, OptionalExtension};

use super::{parse_stored_timestamp, Database, TIMESTAMP_FORMAT};
use crate::error::Result;
use crate::models::{NewTransaction, TransactionRecord};
use crate::store::TransactionSource;

/// Result of inserting a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionInsertResult {
    /// Transaction was inserted, contains new transaction ID
    Inserted(i64),
    /// Transaction was a duplicate, contains existing transaction ID
    Duplicate(i64),
}

/// Counts from a batch insert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct InsertSummary {
    pub inserted: usize,
    pub duplicates: usize,
}

impl Database {
    /// Insert a transaction (skips duplicates based on import_hash)
    pub fn insert_transaction(
        &self,
        user: &str,
        tx: &NewTransaction,
    ) -> Result<TransactionInsertResult> {
        let conn = self.conn()?;
        insert_one(&conn, user, tx)
    }

    /// Insert a batch in one SQLite transaction
    pub fn insert_transactions(&self, user: &str, txs: &[NewTransaction]) -> Result<InsertSummary> {
        let mut conn = self.conn()?;
        let db_tx = conn.transaction()?;
        let mut summary = InsertSummary::default();

        for tx in txs {
            match insert_one(&db_tx, user, tx)? {
                TransactionInsertResult::Inserted(_) => summary.inserted += 1,
                TransactionInsertResult::Duplicate(_) => summary.duplicates += 1,
            }
        }

        db_tx.commit()?;
        Ok(summary)
    }

    /// Number of stored transactions for a user
    pub fn count_transactions(&self, user: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?",
            params![user],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// A user's transactions in insertion order
    pub fn list_transactions(&self, user: &str) -> Result<Vec<TransactionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT merchant_key, amount, occurred_at, category
            FROM transactions
            WHERE user_id = ?
            ORDER BY id
            "#,
        )?;

        let records = stmt
            .query_map(params![user], |row| {
                let occurred_at: Option<String> = row.get(2)?;
                Ok(TransactionRecord {
                    merchant_key: row.get(0)?,
                    amount: row.get(1)?,
                    occurred_at: occurred_at.as_deref().and_then(parse_stored_timestamp),
                    category: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

fn insert_one(
    conn: &rusqlite::Connection,
    user: &str,
    tx: &NewTransaction,
) -> Result<TransactionInsertResult> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM transactions WHERE import_hash = ?",
            params![tx.import_hash],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(existing_id) = existing {
        return Ok(TransactionInsertResult::Duplicate(existing_id));
    }

    let record = &tx.record;
    conn.execute(
        r#"
        INSERT INTO transactions (user_id, merchant_key, amount, occurred_at, category, import_hash)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
        params![
            user,
            record.merchant_key,
            record.amount,
            record
                .occurred_at
                .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string()),
            record.category,
            tx.import_hash,
        ],
    )?;

    Ok(TransactionInsertResult::Inserted(conn.last_insert_rowid()))
}

impl TransactionSource for Database {
    fn load_transactions(&self, user: &str) -> Result<Vec<TransactionRecord>> {
        self.list_transactions(user)
    }
}
