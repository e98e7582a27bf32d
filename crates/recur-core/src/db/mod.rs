//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `transactions` - Imported expenses, deduplicated by `import_hash`
//! - `patterns` - Detected recurring patterns, one row per `(user, merchant)`

use chrono::{NaiveDate, NaiveDateTime};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use tracing::info;

use crate::error::Result;

mod patterns;
mod transactions;

pub use transactions::{InsertSummary, TransactionInsertResult};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Timestamp format for `transactions.occurred_at`; fractional seconds only when present
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Date format for pattern date columns
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a stored timestamp; rows written by this module always match
pub(crate) fn parse_stored_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}

/// Parse a date column inside a row mapper
pub(crate) fn date_column(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (or create) a database and run migrations
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
        });
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        info!(path, "Database ready");
        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` since every pooled
    /// connection to `:memory:` would see its own empty database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "recur_test_{}_{}.db",
            std::process::id(),
            id
        ));

        // Remove any leftover file
        let _ = std::fs::remove_file(&path);

        Self::new(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block the refresh writer
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            -- Imported expenses
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                merchant_key TEXT NOT NULL,
                amount REAL NOT NULL,
                -- NULL when the source timestamp could not be parsed
                occurred_at TEXT,
                category TEXT,
                import_hash TEXT NOT NULL UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id);

            -- Detected patterns, upserted on every refresh; rows for merchants that
            -- stop qualifying are left in place
            CREATE TABLE IF NOT EXISTS recurring_patterns (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                merchant_key TEXT NOT NULL,
                category TEXT,
                avg_amount REAL NOT NULL,
                frequency_label TEXT NOT NULL,
                confidence REAL NOT NULL,
                sample_count INTEGER NOT NULL,
                avg_interval_days REAL NOT NULL,
                std_dev_days REAL NOT NULL,
                last_transaction_date TEXT NOT NULL,
                next_due_date TEXT NOT NULL,
                is_subscription INTEGER NOT NULL DEFAULT 1,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, merchant_key)
            );

            CREATE INDEX IF NOT EXISTS idx_patterns_next_due
                ON recurring_patterns(user_id, next_due_date);
            "#,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests;
