//! Recur Core Library
//!
//! Shared functionality for the Recur recurring-charge detector:
//! - Recurring detection pipeline with a tunable policy
//! - Monthly-equivalent and upcoming-window projections
//! - CSV import boundary
//! - Storage collaborators (SQLite and in-memory)

pub mod db;
pub mod detect;
pub mod error;
pub mod forecast;
pub mod import;
pub mod models;
pub mod policy;
pub mod refresh;
pub mod store;

pub use db::{Database, InsertSummary, TransactionInsertResult};
pub use detect::{detect_recurring, RecurringDetector};
pub use error::{Error, Result};
pub use forecast::{monthly_equivalent, monthly_equivalents, upcoming, MonthlyEquivalent, MonthlySummary};
pub use import::{parse_csv, parse_csv_file, prepare_transaction, ParsedImport};
pub use models::{
    FrequencyLabel, NewTransaction, RecurringPattern, TransactionInput, TransactionRecord,
};
pub use policy::{ClusterStrategy, DetectionPolicy};
pub use refresh::{refresh_patterns, RefreshSummary};
pub use store::{InMemoryStore, PatternStore, TransactionSource};
