//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_policy` - Resolve the detection policy
//! - `cmd_init` - Initialize the database
//! - `cmd_detect` / `cmd_detect_file` - Run recurring detection
//! - `cmd_policy` - Print the effective policy

use std::path::Path;

use anyhow::{Context, Result};
use recur_core::{
    db::Database, import::parse_csv_file, refresh::refresh_patterns, DetectionPolicy,
    RecurringDetector,
};
use tracing::debug;

use super::patterns::print_patterns;

/// Open (and migrate) the database
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

/// Resolve the policy from `--policy`, the data-dir override, or defaults
pub fn load_policy(path: Option<&Path>) -> Result<DetectionPolicy> {
    let policy = DetectionPolicy::load(path).context("Failed to load detection policy")?;
    debug!(
        cluster_strategy = %policy.cluster_strategy,
        amount_tolerance = policy.amount_tolerance,
        min_samples = policy.min_samples,
        "Detection policy loaded"
    );
    Ok(policy)
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path)?;

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Import transactions: recur import --file statement.csv");
    println!("  2. Detect recurring charges: recur detect");
    println!("  3. Start the API: recur serve");

    Ok(())
}

/// Refresh stored patterns from stored transactions
pub fn cmd_detect(db: &Database, user: &str, policy: DetectionPolicy, json: bool) -> Result<()> {
    let detector = RecurringDetector::with_policy(policy);
    let summary = refresh_patterns(db, db, &detector, user).context("Failed to refresh patterns")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.skipped {
        println!("⚠️  Could not load transactions; nothing was refreshed.");
        return Ok(());
    }

    println!("🔍 Scanned {} transactions", summary.transactions_scanned);
    println!(
        "   Found {} patterns, saved {}",
        summary.patterns_found, summary.patterns_saved
    );

    let patterns = db.list_patterns(user)?;
    print_patterns(&patterns);

    Ok(())
}

/// Detect straight from a CSV, without the database
pub fn cmd_detect_file(file: &Path, user: &str, policy: DetectionPolicy, json: bool) -> Result<()> {
    let parsed = parse_csv_file(file, user)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let patterns = RecurringDetector::with_policy(policy).detect(&parsed.records());

    if json {
        println!("{}", serde_json::to_string_pretty(&patterns)?);
        return Ok(());
    }

    println!(
        "🔍 Analyzed {} transactions from {} ({} rows skipped)",
        parsed.transactions.len(),
        file.display(),
        parsed.skipped
    );
    print_patterns(&patterns);

    Ok(())
}

pub fn cmd_policy(policy: &DetectionPolicy) -> Result<()> {
    print!("{}", policy.to_toml()?);
    Ok(())
}
