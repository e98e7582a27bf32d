//! CSV input boundary
//!
//! Bank exports vary in column order and naming, so columns are located by
//! header name rather than position. Each accepted row becomes a
//! [`NewTransaction`] whose `import_hash` makes re-imports idempotent.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{NewTransaction, TransactionInput, TransactionRecord};

const DATE_HEADERS: &[&str] = &["date", "transaction date", "posted date", "occurred_at"];
const DESCRIPTION_HEADERS: &[&str] = &["description", "memo", "name"];
const MERCHANT_HEADERS: &[&str] = &["merchant", "payee"];
const AMOUNT_HEADERS: &[&str] = &["amount"];
const DEBIT_HEADERS: &[&str] = &["debit"];
const CATEGORY_HEADERS: &[&str] = &["category"];

/// Rows accepted from a CSV, plus how many were skipped
#[derive(Debug, Clone, Default)]
pub struct ParsedImport {
    pub transactions: Vec<NewTransaction>,
    /// Rows that were not importable expenses
    pub skipped: usize,
}

impl ParsedImport {
    /// The typed records, for detecting without storing
    pub fn records(&self) -> Vec<TransactionRecord> {
        self.transactions.iter().map(|t| t.record.clone()).collect()
    }
}

/// Where each field lives in the file
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: usize,
    description: Option<usize>,
    merchant: Option<usize>,
    amount: AmountColumn,
    category: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
enum AmountColumn {
    /// Signed amounts; negative values are expenses
    Signed(usize),
    /// Debit column; positive values are expenses
    Debit(usize),
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
        };

        let date = find(DATE_HEADERS)
            .ok_or_else(|| Error::Import("CSV has no date column".into()))?;

        let amount = match (find(AMOUNT_HEADERS), find(DEBIT_HEADERS)) {
            (Some(i), _) => AmountColumn::Signed(i),
            (None, Some(i)) => AmountColumn::Debit(i),
            (None, None) => return Err(Error::Import("CSV has no amount or debit column".into())),
        };

        let description = find(DESCRIPTION_HEADERS);
        let merchant = find(MERCHANT_HEADERS);
        if description.is_none() && merchant.is_none() {
            return Err(Error::Import(
                "CSV has no description or merchant column".into(),
            ));
        }

        Ok(Self {
            date,
            description,
            merchant,
            amount,
            category: find(CATEGORY_HEADERS),
        })
    }
}

/// Dedup hash for a stored transaction
pub fn import_hash(user: &str, date_text: &str, merchant_key: &str, amount: f64) -> String {
    let mut hasher = Sha256::new();
    for part in [user.as_bytes(), date_text.trim().as_bytes(), merchant_key.as_bytes()] {
        hasher.update(part);
        hasher.update([0u8]);
    }
    hasher.update(amount.to_be_bytes());
    hex::encode(hasher.finalize())
}

/// Validate a boundary input and attach its dedup hash
pub fn prepare_transaction(user: &str, input: &TransactionInput) -> Result<NewTransaction> {
    let record = TransactionRecord::from_input(input)?;
    if !(record.amount.is_finite() && record.amount > 0.0) {
        return Err(Error::InvalidData(format!(
            "amount must be positive, got {}",
            record.amount
        )));
    }

    let import_hash = import_hash(user, &input.occurred_at, &record.merchant_key, record.amount);
    Ok(NewTransaction {
        record,
        import_hash,
    })
}

/// Parse a bank-export CSV into transactions for `user`
pub fn parse_csv<R: Read>(reader: R, user: &str) -> Result<ParsedImport> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = ColumnMap::from_headers(rdr.headers()?)?;
    let mut parsed = ParsedImport::default();

    for (line, result) in rdr.records().enumerate() {
        let record = result?;

        let Some(input) = row_to_input(&record, &columns, line) else {
            parsed.skipped += 1;
            continue;
        };

        match prepare_transaction(user, &input) {
            Ok(tx) => parsed.transactions.push(tx),
            Err(e) => {
                debug!(line, error = %e, "Skipping CSV row");
                parsed.skipped += 1;
            }
        }
    }

    debug!(
        imported = parsed.transactions.len(),
        skipped = parsed.skipped,
        "Parsed CSV"
    );
    Ok(parsed)
}

/// Open and parse a CSV file
pub fn parse_csv_file(path: &Path, user: &str) -> Result<ParsedImport> {
    let file = File::open(path)?;
    parse_csv(file, user)
}

/// Turn one row into an input, or `None` when it is not an expense
fn row_to_input(record: &StringRecord, columns: &ColumnMap, line: usize) -> Option<TransactionInput> {
    let field = |idx: Option<usize>| {
        idx.and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let amount = match columns.amount {
        AmountColumn::Signed(i) => {
            let raw = record.get(i).unwrap_or_default();
            let amount = match parse_amount(raw) {
                Ok(a) => a,
                Err(e) => {
                    debug!(line, error = %e, "Skipping row with bad amount");
                    return None;
                }
            };
            if amount >= 0.0 {
                debug!(line, amount, "Skipping credit");
                return None;
            }
            -amount
        }
        AmountColumn::Debit(i) => {
            let raw = record.get(i).unwrap_or_default();
            if raw.is_empty() {
                // credit-only row
                return None;
            }
            match parse_amount(raw) {
                Ok(a) => a.abs(),
                Err(e) => {
                    debug!(line, error = %e, "Skipping row with bad debit");
                    return None;
                }
            }
        }
    };

    Some(TransactionInput {
        merchant: field(columns.merchant),
        description: field(columns.description),
        amount,
        occurred_at: record.get(columns.date).unwrap_or_default().to_string(),
        category: field(columns.category),
    })
}

/// Parse an amount string, handling currency symbols, commas and parentheses
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .map_err(|_| Error::Import(format!("Unable to parse amount: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("-123.45").unwrap(), -123.45);
        assert_eq!(parse_amount("(100.00)").unwrap(), -100.00);
        assert!(parse_amount("n/a").is_err());
    }

    #[test]
    fn test_signed_amounts_keep_expenses_only() {
        let csv = "Transaction Date,Post Date,Description,Category,Type,Amount,Memo
01/15/2024,01/16/2024,NETFLIX.COM,Entertainment,Sale,-15.99,
01/14/2024,01/15/2024,PAYROLL,Income,Credit,2500.00,
01/13/2024,01/14/2024,STARBUCKS,Food & Drink,Sale,-5.50,";

        let parsed = parse_csv(csv.as_bytes(), "alice").unwrap();
        assert_eq!(parsed.transactions.len(), 2);
        assert_eq!(parsed.skipped, 1);

        let netflix = &parsed.transactions[0].record;
        assert_eq!(netflix.merchant_key, "NETFLIX.COM");
        assert_eq!(netflix.amount, 15.99);
        assert_eq!(netflix.category.as_deref(), Some("Entertainment"));
        assert_eq!(
            netflix.date(),
            Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
    }

    #[test]
    fn test_merchant_column_preferred_over_description() {
        let csv = "date,payee,memo,amount
2024-02-01,Spotify,SPOTIFY USA 1234,-9.99
2024-02-02,,GYM MEMBERSHIP,-40.00";

        let parsed = parse_csv(csv.as_bytes(), "alice").unwrap();
        assert_eq!(parsed.transactions[0].record.merchant_key, "Spotify");
        assert_eq!(parsed.transactions[1].record.merchant_key, "GYM MEMBERSHIP");
    }

    #[test]
    fn test_debit_column() {
        let csv = "Date,Description,Debit,Credit
03/01/2024,ELECTRIC CO,84.10,
03/02/2024,REFUND,,12.00";

        let parsed = parse_csv(csv.as_bytes(), "alice").unwrap();
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.transactions[0].record.amount, 84.10);
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_bad_amount_skipped_bad_date_kept() {
        let csv = "date,description,amount
2024-01-01,Spotify,abc
not a date,Spotify,-9.99";

        let parsed = parse_csv(csv.as_bytes(), "alice").unwrap();
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.transactions.len(), 1);
        assert!(parsed.transactions[0].record.occurred_at.is_none());
    }

    #[test]
    fn test_missing_columns_rejected() {
        assert!(parse_csv("description,amount\nX,-1".as_bytes(), "alice").is_err());
        assert!(parse_csv("date,description\n2024-01-01,X".as_bytes(), "alice").is_err());
        assert!(parse_csv("date,amount\n2024-01-01,-1".as_bytes(), "alice").is_err());
    }

    #[test]
    fn test_import_hash_is_stable_and_user_scoped() {
        let a = import_hash("alice", "2024-01-01", "Spotify", 9.99);
        assert_eq!(a, import_hash("alice", " 2024-01-01 ", "Spotify", 9.99));
        assert_ne!(a, import_hash("bob", "2024-01-01", "Spotify", 9.99));
        assert_ne!(a, import_hash("alice", "2024-02-01", "Spotify", 9.99));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_prepare_rejects_non_positive_amount() {
        let input = TransactionInput {
            merchant: Some("Gym".into()),
            description: None,
            amount: -40.0,
            occurred_at: "2024-01-01".into(),
            category: None,
        };
        assert!(prepare_transaction("alice", &input).is_err());
    }
}
