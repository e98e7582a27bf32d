//! Stored pattern listings and projections

use anyhow::Result;
use chrono::NaiveDate;
use recur_core::{
    db::Database,
    forecast::{monthly_equivalents, upcoming},
    models::RecurringPattern,
};

use super::truncate;

/// Print a pattern table, or a hint when there is nothing to show
pub fn print_patterns(patterns: &[RecurringPattern]) {
    if patterns.is_empty() {
        println!("No recurring patterns detected yet. Run:");
        println!("  recur import --file statement.csv");
        println!("  recur detect");
        return;
    }

    println!();
    println!("🔁 Recurring Patterns");
    println!("   ─────────────────────────────────────────────────────────────────────");

    for p in patterns {
        println!(
            "   {:24} │ {:>9} │ {:<14} │ {:>3.0}% │ next {}",
            truncate(&p.merchant_key, 24),
            format!("${:.2}", p.avg_amount),
            p.frequency_label.to_string(),
            p.confidence * 100.0,
            p.next_due_date
        );
    }
}

pub fn cmd_patterns(db: &Database, user: &str, json: bool) -> Result<()> {
    let patterns = db.list_patterns(user)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&patterns)?);
        return Ok(());
    }

    print_patterns(&patterns);
    Ok(())
}

pub fn cmd_upcoming(db: &Database, user: &str, today: NaiveDate, days: u32, json: bool) -> Result<()> {
    let due = upcoming(&db.list_patterns(user)?, today, days);

    if json {
        println!("{}", serde_json::to_string_pretty(&due)?);
        return Ok(());
    }

    if due.is_empty() {
        println!("Nothing due in the next {} days.", days);
        return Ok(());
    }

    println!();
    println!("📅 Due in the next {} days", days);
    println!("   ─────────────────────────────────────────────────────");

    let mut total = 0.0;
    for p in &due {
        let in_days = (p.next_due_date - today).num_days();
        let when = match in_days {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            n => format!("in {} days", n),
        };
        println!(
            "   {} │ {:24} │ {:>9} │ {}",
            p.next_due_date,
            truncate(&p.merchant_key, 24),
            format!("${:.2}", p.avg_amount),
            when
        );
        total += p.avg_amount;
    }

    println!("   ─────────────────────────────────────────────────────");
    println!("   Total: ${:.2}", total);

    Ok(())
}

pub fn cmd_monthly(db: &Database, user: &str, json: bool) -> Result<()> {
    let summary = monthly_equivalents(&db.list_patterns(user)?);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.rows.is_empty() {
        println!("No recurring patterns detected yet. Run:");
        println!("  recur detect");
        return Ok(());
    }

    println!();
    println!("💰 Monthly Cost");
    println!("   ─────────────────────────────────────────────────────");

    for row in &summary.rows {
        println!(
            "   {:24} │ {:>9} {:<14} │ {:>9}/mo",
            truncate(&row.merchant_key, 24),
            format!("${:.2}", row.amount),
            row.frequency_label.to_string(),
            format!("${:.2}", row.monthly_amount)
        );
    }

    println!("   ─────────────────────────────────────────────────────");
    println!("   Total: ${:.2}/mo", summary.total_monthly);

    Ok(())
}
