//! Import command implementation

use std::path::Path;

use anyhow::{Context, Result};
use recur_core::{db::Database, import::parse_csv_file};

pub fn cmd_import(db: &Database, user: &str, file: &Path) -> Result<()> {
    println!("📥 Importing {} for user {}...", file.display(), user);

    let parsed = parse_csv_file(file, user)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    println!("   Found {} expenses", parsed.transactions.len());
    if parsed.skipped > 0 {
        println!("   Skipped {} rows (credits or unreadable amounts)", parsed.skipped);
    }

    let summary = db
        .insert_transactions(user, &parsed.transactions)
        .context("Failed to store transactions")?;

    println!(
        "✅ Imported {} new transactions ({} duplicates skipped)",
        summary.inserted, summary.duplicates
    );
    println!("   Run 'recur detect' to refresh recurring patterns.");

    Ok(())
}
