//! Override Resolver (pure half): edit-store rows into an [`OverrideMap`],
//! and substitution of one override onto a transaction.
//!
//! The fetch itself lives with the collaborators; a failed fetch simply
//! hands an empty row list here.

use serde_json::Value;

use crate::coerce;
use crate::model::{Override, OverrideMap, RentOutLegs, Settlement, Transaction};

/// Build the key→override map. Keys are stringified and trimmed; rows with
/// no invoice identifier are skipped. Later rows for the same key win.
pub fn build_override_map(rows: &[Value]) -> OverrideMap {
    let mut map = OverrideMap::new();
    for row in rows {
        if let Some(ov) = parse_override(row) {
            map.insert(ov.invoice_key.clone(), ov);
        }
    }
    tracing::debug!(source = "overrides", rows = map.len(), "resolved");
    map
}

pub fn parse_override(row: &Value) -> Option<Override> {
    let invoice_key = coerce::first_text(row, &["invoiceNo"])?;
    Some(Override {
        invoice_key,
        settlement: Settlement {
            cash: coerce::amount(row, &["cash"]),
            bank: coerce::amount(row, &["bank"]),
            upi: coerce::amount(row, &["upi"]),
            rbl: coerce::amount(row, &["rbl"]),
        },
        security: coerce::optional_amount(row, &["securityAmount"]),
        balance_payable: coerce::optional_amount(row, &["Balance"]),
        declared_total: coerce::optional_amount(row, &["totalTransaction", "amount"]),
    })
}

/// Produce a corrected copy of `txn`. Identity and display fields (invoice,
/// date, category, customer) are kept; settlement fields are replaced and
/// totals recomputed.
pub fn apply_override(txn: &Transaction, ov: &Override) -> Transaction {
    let mut out = txn.clone();
    out.settlement = ov.settlement;
    if let Some(legs) = txn.rent_out {
        out.rent_out = Some(RentOutLegs {
            security: ov.security.unwrap_or(legs.security),
            balance_payable: ov.balance_payable.unwrap_or(legs.balance_payable),
        });
    }
    out.recompute_totals();

    if let Some(declared) = ov.declared_total {
        if declared != out.total_transaction {
            tracing::warn!(
                invoice = %ov.invoice_key,
                declared,
                recomputed = out.total_transaction,
                "override total disagrees with its channels; using channel sum"
            );
        }
    }
    out
}

/// Look up the override for `txn`, matching on the trimmed invoice key.
pub fn lookup<'a>(overrides: &'a OverrideMap, txn: &Transaction) -> Option<&'a Override> {
    overrides.get(txn.invoice_key.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Provenance};
    use chrono::NaiveDate;
    use serde_json::json;

    fn txn(key: &str, category: Category, cash: i64) -> Transaction {
        let mut t = Transaction {
            invoice_key: key.into(),
            location_code: "L1".into(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            category,
            sub_category: "Security Refund".into(),
            sub_category1: None,
            settlement: Settlement { cash, ..Settlement::default() },
            rent_out: None,
            amount: 0,
            total_transaction: 0,
            bill_value: 0,
            customer_name: "Ravi".into(),
            remark: String::new(),
            source: Provenance::Return,
            ledger_id: None,
        };
        t.recompute_totals();
        t
    }

    #[test]
    fn keys_are_trimmed_and_stringified() {
        let rows = vec![
            json!({"invoiceNo": "  R-7 ", "cash": -300}),
            json!({"invoiceNo": 1042, "bank": 50}),
            json!({"cash": 10}),
        ];
        let map = build_override_map(&rows);
        assert_eq!(map.len(), 2);
        assert_eq!(map["R-7"].settlement.cash, -30000);
        assert_eq!(map["1042"].settlement.bank, 5000);
    }

    #[test]
    fn override_replaces_settlement_only() {
        let original = txn("R-7", Category::Return, -25000);
        let ov = parse_override(&json!({"invoiceNo": "R-7", "cash": -300, "bank": 0, "upi": 0})).unwrap();
        let merged = apply_override(&original, &ov);
        assert_eq!(merged.settlement.cash, -30000);
        assert_eq!(merged.amount, -30000);
        assert_eq!(merged.total_transaction, -30000);
        assert_eq!(merged.customer_name, "Ravi");
        assert_eq!(merged.category, Category::Return);
        assert_eq!(merged.date, original.date);
        assert_eq!(merged.invoice_key, "R-7");
    }

    #[test]
    fn rentout_override_keeps_missing_legs() {
        let mut original = txn("RO-1", Category::RentOut, 1000);
        original.rent_out = Some(RentOutLegs { security: 2000, balance_payable: 3000 });
        original.recompute_totals();

        let ov = parse_override(&json!({"invoiceNo": "RO-1", "cash": 15, "securityAmount": 25})).unwrap();
        let merged = apply_override(&original, &ov);
        let legs = merged.rent_out.unwrap();
        assert_eq!(legs.security, 2500);
        assert_eq!(legs.balance_payable, 3000);
        assert_eq!(merged.total_transaction, 5500);
        assert_eq!(merged.settlement.cash, 1500);
    }

    #[test]
    fn lookup_trims_transaction_key() {
        let map = build_override_map(&[json!({"invoiceNo": "K-1", "cash": 1})]);
        let t = txn(" K-1 ", Category::Booking, 0);
        assert!(lookup(&map, &t).is_some());
    }
}
