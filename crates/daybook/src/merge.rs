//! Merge Engine.
//!
//! 1. Concatenate normalized lists in provider order (Booking, RentOut,
//!    Return, Cancel, Ledger).
//! 2. Substitute overrides by trimmed invoice key.
//! 3. Deduplicate on `(invoice_key, date, category)`, keeping the LAST
//!    occurrence: ledger rows come after booking-API rows and win.
//!
//! The output keeps first-seen position per key; downstream consumers only
//! sum or filter, so order carries no meaning beyond stable iteration.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;

use crate::model::{OverrideMap, Transaction};
use crate::overrides::{apply_override, lookup};

/// Composite dedup key. Not guaranteed unique for distinct transactions
/// sharing invoice, date and category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey {
    pub invoice_key: String,
    pub date: NaiveDate,
    pub category: String,
}

impl DedupKey {
    pub fn of(txn: &Transaction) -> Self {
        Self {
            invoice_key: txn.invoice_key.trim().to_string(),
            date: txn.date,
            category: txn.category.key(),
        }
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\u{2016}{}\u{2016}{}", self.invoice_key, self.date.format("%Y-%m-%d"), self.category)
    }
}

/// Merge all normalized lists, apply overrides, deduplicate.
pub fn merge(lists: Vec<Vec<Transaction>>, overrides: &OverrideMap) -> Vec<Transaction> {
    let concatenated = lists.into_iter().flatten();
    let substituted = concatenated.map(|txn| match lookup(overrides, &txn) {
        Some(ov) => apply_override(&txn, ov),
        None => txn,
    });
    dedup_keep_last(substituted)
}

/// Keep the last transaction per [`DedupKey`], at the first-seen position.
pub fn dedup_keep_last<I>(txns: I) -> Vec<Transaction>
where
    I: IntoIterator<Item = Transaction>,
{
    let mut slots: HashMap<DedupKey, usize> = HashMap::new();
    let mut out: Vec<Transaction> = Vec::new();
    let mut replaced = 0usize;

    for txn in txns {
        let key = DedupKey::of(&txn);
        match slots.get(&key) {
            Some(&idx) => {
                tracing::trace!(key = %key, kept = %txn.source, dropped = %out[idx].source, "duplicate");
                out[idx] = txn;
                replaced += 1;
            }
            None => {
                slots.insert(key, out.len());
                out.push(txn);
            }
        }
    }

    if replaced > 0 {
        tracing::debug!(replaced, kept = out.len(), "deduplicated");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Override, Provenance, Settlement};

    fn txn(key: &str, date: &str, category: Category, cash: i64, source: Provenance) -> Transaction {
        let mut t = Transaction {
            invoice_key: key.into(),
            location_code: "L1".into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            category,
            sub_category: String::new(),
            sub_category1: None,
            settlement: Settlement { cash, ..Settlement::default() },
            rent_out: None,
            amount: 0,
            total_transaction: 0,
            bill_value: 0,
            customer_name: String::new(),
            remark: String::new(),
            source,
            ledger_id: None,
        };
        t.recompute_totals();
        t
    }

    #[test]
    fn ledger_wins_over_booking_api() {
        let api = vec![txn("B-100", "2025-03-01", Category::Booking, 500000, Provenance::Booking)];
        let ledger = vec![txn("B-100", "2025-03-01", Category::Booking, 520000, Provenance::Ledger)];
        let merged = merge(vec![api, ledger], &OverrideMap::new());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].settlement.cash, 520000);
        assert_eq!(merged[0].source, Provenance::Ledger);
        assert_eq!(DedupKey::of(&merged[0]).to_string(), "B-100\u{2016}2025-03-01\u{2016}booking");
    }

    #[test]
    fn distinct_category_or_date_are_kept() {
        let rows = vec![
            txn("X", "2025-03-01", Category::Booking, 1, Provenance::Booking),
            txn("X", "2025-03-01", Category::RentOut, 2, Provenance::RentOut),
            txn("X", "2025-03-02", Category::Booking, 3, Provenance::Booking),
        ];
        assert_eq!(merge(vec![rows], &OverrideMap::new()).len(), 3);
    }

    #[test]
    fn keep_last_at_first_position() {
        let rows = vec![
            txn("A", "2025-03-01", Category::Return, -1, Provenance::Return),
            txn("B", "2025-03-01", Category::Return, -2, Provenance::Return),
            txn("A", "2025-03-01", Category::Return, -3, Provenance::Ledger),
        ];
        let out = dedup_keep_last(rows);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].invoice_key, "A");
        assert_eq!(out[0].settlement.cash, -3);
        assert_eq!(out[1].invoice_key, "B");
    }

    #[test]
    fn overrides_apply_before_dedup() {
        let mut overrides = OverrideMap::new();
        overrides.insert(
            "R-7".into(),
            Override {
                invoice_key: "R-7".into(),
                settlement: Settlement { cash: -30000, ..Settlement::default() },
                security: None,
                balance_payable: None,
                declared_total: None,
            },
        );
        let rows = vec![txn("R-7 ", "2025-03-03", Category::Return, -25000, Provenance::Return)];
        let out = merge(vec![rows], &overrides);
        assert_eq!(out[0].settlement.cash, -30000);
        assert_eq!(out[0].total_transaction, -30000);
    }

    #[test]
    fn merge_is_idempotent() {
        let rows = vec![
            txn("A", "2025-03-01", Category::Booking, 1, Provenance::Booking),
            txn("A", "2025-03-01", Category::Booking, 2, Provenance::Ledger),
            txn("B", "2025-03-01", Category::Income, 3, Provenance::Ledger),
        ];
        let once = merge(vec![rows], &OverrideMap::new());
        let twice = merge(vec![once.clone()], &OverrideMap::new());
        assert_eq!(once, twice);
    }
}
