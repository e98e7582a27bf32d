//! Merchant grouping

use std::collections::HashMap;

use crate::models::TransactionRecord;

/// All transactions sharing one merchant key, in input order
#[derive(Debug, Clone)]
pub struct MerchantGroup<'a> {
    pub merchant_key: &'a str,
    pub transactions: Vec<&'a TransactionRecord>,
}

/// Partition transactions by merchant key
///
/// Groups come back in order of each key's first appearance. Single-member
/// groups are dropped since they cannot form a pattern.
pub fn group_by_merchant(transactions: &[TransactionRecord]) -> Vec<MerchantGroup<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<MerchantGroup<'_>> = Vec::new();

    for tx in transactions {
        let key = tx.merchant_key.as_str();
        match index.get(key) {
            Some(&i) => groups[i].transactions.push(tx),
            None => {
                index.insert(key, groups.len());
                groups.push(MerchantGroup {
                    merchant_key: key,
                    transactions: vec![tx],
                });
            }
        }
    }

    groups.retain(|g| g.transactions.len() >= 2);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(merchant: &str, amount: f64, day: u32) -> TransactionRecord {
        let ts = NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        TransactionRecord::new(merchant, amount, ts)
    }

    #[test]
    fn test_groups_preserve_first_seen_order() {
        let txs = vec![
            tx("Spotify", 9.99, 1),
            tx("Netflix", 15.49, 2),
            tx("Spotify", 9.99, 3),
            tx("Netflix", 15.49, 4),
        ];

        let groups = group_by_merchant(&txs);
        let keys: Vec<_> = groups.iter().map(|g| g.merchant_key).collect();
        assert_eq!(keys, vec!["Spotify", "Netflix"]);
        assert_eq!(groups[0].transactions[1].date(), txs[2].date());
    }

    #[test]
    fn test_single_member_groups_dropped() {
        let txs = vec![
            tx("Spotify", 9.99, 1),
            tx("Coffee Shop", 4.50, 2),
            tx("Spotify", 9.99, 3),
        ];

        let groups = group_by_merchant(&txs);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].merchant_key, "Spotify");
    }

    #[test]
    fn test_keys_are_exact_match() {
        let txs = vec![tx("SPOTIFY", 9.99, 1), tx("Spotify", 9.99, 2)];
        assert!(group_by_merchant(&txs).is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(group_by_merchant(&[]).is_empty());
    }
}
