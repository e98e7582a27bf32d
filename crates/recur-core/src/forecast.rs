//! Read-only projections over persisted patterns
//!
//! - Monthly equivalents: what each pattern costs per month
//! - Upcoming window: patterns due within the next N days

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{FrequencyLabel, RecurringPattern};

/// Average weeks per month
pub const WEEKS_PER_MONTH: f64 = 4.33;

/// Average two-week periods per month
pub const BIWEEKS_PER_MONTH: f64 = 2.17;

/// Average days per month
pub const DAYS_PER_MONTH: f64 = 30.42;

/// Normalize an amount charged at `frequency` to a monthly figure
///
/// Calendar-average factors, not exact calendar math. Monthly, "every N days"
/// and irregular cadences pass through unchanged.
pub fn monthly_equivalent(amount: f64, frequency: FrequencyLabel) -> f64 {
    match frequency {
        FrequencyLabel::Yearly => amount / 12.0,
        FrequencyLabel::Quarterly => amount / 3.0,
        FrequencyLabel::BiWeekly => amount * BIWEEKS_PER_MONTH,
        FrequencyLabel::Weekly => amount * WEEKS_PER_MONTH,
        FrequencyLabel::Daily => amount * DAYS_PER_MONTH,
        FrequencyLabel::Monthly | FrequencyLabel::EveryNDays(_) | FrequencyLabel::Irregular => {
            amount
        }
    }
}

/// One pattern's monthly cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyEquivalent {
    pub merchant_key: String,
    pub frequency_label: FrequencyLabel,
    pub amount: f64,
    pub monthly_amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub rows: Vec<MonthlyEquivalent>,
    pub total_monthly: f64,
}

/// Apply [`monthly_equivalent`] to every pattern
pub fn monthly_equivalents(patterns: &[RecurringPattern]) -> MonthlySummary {
    let rows: Vec<MonthlyEquivalent> = patterns
        .iter()
        .map(|p| MonthlyEquivalent {
            merchant_key: p.merchant_key.clone(),
            frequency_label: p.frequency_label,
            amount: p.avg_amount,
            monthly_amount: monthly_equivalent(p.avg_amount, p.frequency_label),
        })
        .collect();

    let total_monthly = rows.iter().map(|r| r.monthly_amount).sum();

    MonthlySummary {
        rows,
        total_monthly,
    }
}

/// Patterns due in `[today, today + days]`, soonest first
pub fn upcoming(patterns: &[RecurringPattern], today: NaiveDate, days: u32) -> Vec<RecurringPattern> {
    let horizon = today + Duration::days(i64::from(days));

    let mut due: Vec<RecurringPattern> = patterns
        .iter()
        .filter(|p| p.next_due_date >= today && p.next_due_date <= horizon)
        .cloned()
        .collect();

    due.sort_by_key(|p| p.next_due_date);
    due
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pattern(key: &str, amount: f64, label: FrequencyLabel, next_due: NaiveDate) -> RecurringPattern {
        RecurringPattern {
            merchant_key: key.to_string(),
            category: None,
            avg_amount: amount,
            frequency_label: label,
            confidence: 0.8,
            sample_count: 3,
            avg_interval_days: 30.0,
            std_dev_days: 0.0,
            last_transaction_date: next_due - Duration::days(30),
            next_due_date: next_due,
            is_subscription: true,
        }
    }

    #[test]
    fn test_monthly_equivalent_factors() {
        assert_eq!(monthly_equivalent(120.0, FrequencyLabel::Quarterly), 40.0);
        assert_eq!(monthly_equivalent(120.0, FrequencyLabel::Yearly), 10.0);
        assert!((monthly_equivalent(10.0, FrequencyLabel::Weekly) - 43.3).abs() < 1e-9);
        assert!((monthly_equivalent(10.0, FrequencyLabel::BiWeekly) - 21.7).abs() < 1e-9);
        assert!((monthly_equivalent(1.0, FrequencyLabel::Daily) - 30.42).abs() < 1e-9);
    }

    #[test]
    fn test_other_cadences_pass_through() {
        assert_eq!(monthly_equivalent(15.49, FrequencyLabel::Monthly), 15.49);
        assert_eq!(monthly_equivalent(50.0, FrequencyLabel::EveryNDays(45)), 50.0);
        assert_eq!(monthly_equivalent(7.0, FrequencyLabel::Irregular), 7.0);
    }

    #[test]
    fn test_monthly_summary_total() {
        let due = date(2024, 6, 1);
        let summary = monthly_equivalents(&[
            pattern("Insurance", 120.0, FrequencyLabel::Quarterly, due),
            pattern("Netflix", 15.0, FrequencyLabel::Monthly, due),
        ]);

        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].monthly_amount, 40.0);
        assert_eq!(summary.total_monthly, 55.0);
    }

    #[test]
    fn test_monthly_summary_empty() {
        assert_eq!(monthly_equivalents(&[]), MonthlySummary::default());
    }

    #[test]
    fn test_upcoming_window_is_inclusive() {
        let today = date(2024, 6, 1);
        let patterns = vec![
            pattern("Yesterday", 1.0, FrequencyLabel::Monthly, date(2024, 5, 31)),
            pattern("Edge", 1.0, FrequencyLabel::Monthly, date(2024, 7, 1)),
            pattern("Today", 1.0, FrequencyLabel::Monthly, today),
            pattern("Mid", 1.0, FrequencyLabel::Monthly, date(2024, 6, 15)),
            pattern("Beyond", 1.0, FrequencyLabel::Monthly, date(2024, 7, 2)),
        ];

        let due = upcoming(&patterns, today, 30);
        let keys: Vec<_> = due.iter().map(|p| p.merchant_key.as_str()).collect();
        assert_eq!(keys, vec!["Today", "Mid", "Edge"]);
    }

    #[test]
    fn test_upcoming_zero_days_is_today_only() {
        let today = date(2024, 6, 1);
        let patterns = vec![
            pattern("Today", 1.0, FrequencyLabel::Monthly, today),
            pattern("Tomorrow", 1.0, FrequencyLabel::Monthly, date(2024, 6, 2)),
        ];
        assert_eq!(upcoming(&patterns, today, 0).len(), 1);
    }
}
