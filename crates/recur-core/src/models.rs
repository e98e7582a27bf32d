//! Domain models for Recur

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A transaction as it arrives from a caller (JSON body, CSV row)
///
/// Fields are loosely typed here; `TransactionRecord::from_input` is the
/// boundary that turns this into the typed record the detector consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInput {
    /// Merchant name, if the source recorded one
    #[serde(default)]
    pub merchant: Option<String>,
    /// Free-text description (used as the key when no merchant is set)
    #[serde(default)]
    pub description: Option<String>,
    /// Expense amount (positive)
    pub amount: f64,
    /// Timestamp text (RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`, or `MM/DD/YYYY`)
    pub occurred_at: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// A single expense, the detector's unit of input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub merchant_key: String,
    pub amount: f64,
    /// `None` when the source timestamp could not be parsed. Such records are
    /// grouped and clustered like any other, then dropped before interval analysis.
    pub occurred_at: Option<NaiveDateTime>,
    pub category: Option<String>,
}

impl TransactionRecord {
    pub fn new(merchant_key: impl Into<String>, amount: f64, occurred_at: NaiveDateTime) -> Self {
        Self {
            merchant_key: merchant_key.into(),
            amount,
            occurred_at: Some(occurred_at),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Convert a boundary input into a typed record
    ///
    /// The merchant key is the trimmed merchant name, falling back to the
    /// description. Inputs with neither are rejected. An unparseable timestamp
    /// is not an error here.
    pub fn from_input(input: &TransactionInput) -> Result<Self> {
        let merchant_key = non_empty(input.merchant.as_deref())
            .or_else(|| non_empty(input.description.as_deref()))
            .ok_or_else(|| {
                Error::InvalidData("transaction has neither merchant nor description".into())
            })?;

        Ok(Self {
            merchant_key,
            amount: input.amount,
            occurred_at: parse_timestamp(&input.occurred_at),
            category: non_empty(input.category.as_deref()),
        })
    }

    /// Calendar date of the transaction, if known
    pub fn date(&self) -> Option<NaiveDate> {
        self.occurred_at.map(|ts| ts.date())
    }
}

/// A transaction ready to store, with its dedup hash
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub record: TransactionRecord,
    /// SHA-256 over user, source date text, merchant key and amount
    pub import_hash: String,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse the timestamp formats seen in bank exports and API payloads
///
/// Date-only values resolve to midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    // Two-digit years first: `%Y` would read "24" as year 24
    for fmt in ["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Recurrence cadence of a pattern
///
/// The detector only emits the named cadences and `EveryNDays`; `Daily` and
/// `Irregular` exist for patterns persisted by other sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FrequencyLabel {
    Daily,
    Weekly,
    BiWeekly,
    Monthly,
    Quarterly,
    Yearly,
    EveryNDays(u32),
    Irregular,
}

impl std::str::FromStr for FrequencyLabel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "daily" => return Ok(Self::Daily),
            "weekly" => return Ok(Self::Weekly),
            "bi-weekly" | "biweekly" | "fortnightly" => return Ok(Self::BiWeekly),
            "monthly" => return Ok(Self::Monthly),
            "quarterly" => return Ok(Self::Quarterly),
            "yearly" | "annually" | "annual" => return Ok(Self::Yearly),
            "irregular" => return Ok(Self::Irregular),
            _ => {}
        }

        lower
            .strip_prefix("every ")
            .and_then(|rest| {
                rest.strip_suffix(" days")
                    .or_else(|| rest.strip_suffix(" day"))
            })
            .and_then(|n| n.trim().parse::<u32>().ok())
            .map(Self::EveryNDays)
            .ok_or_else(|| format!("Unknown frequency: {}", s))
    }
}

impl std::fmt::Display for FrequencyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::BiWeekly => write!(f, "bi-weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Quarterly => write!(f, "quarterly"),
            Self::Yearly => write!(f, "yearly"),
            Self::EveryNDays(n) => write!(f, "every {} days", n),
            Self::Irregular => write!(f, "irregular"),
        }
    }
}

impl From<FrequencyLabel> for String {
    fn from(label: FrequencyLabel) -> Self {
        label.to_string()
    }
}

impl TryFrom<String> for FrequencyLabel {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// A group of one merchant's transactions with similar amounts
#[derive(Debug, Clone)]
pub struct AmountCluster {
    /// Amount new members are compared against
    pub representative_amount: f64,
    pub members: Vec<TransactionRecord>,
    pub category: Option<String>,
}

/// A detected recurring charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringPattern {
    pub merchant_key: String,
    pub category: Option<String>,
    pub avg_amount: f64,
    pub frequency_label: FrequencyLabel,
    /// Heuristic score in [0, 1]
    pub confidence: f64,
    pub sample_count: usize,
    pub avg_interval_days: f64,
    pub std_dev_days: f64,
    pub last_transaction_date: NaiveDate,
    pub next_due_date: NaiveDate,
    pub is_subscription: bool,
}
