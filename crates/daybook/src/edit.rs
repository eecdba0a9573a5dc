//! Edit path (pure half).
//!
//! Editing a row is two-phase: `ensure_materialized` creates a ledger record
//! for rows that only exist in the booking API (initial split = current
//! settlement), then `apply_edit` updates that record by id. The side effects
//! live with the collaborators; this module builds the payloads and folds an
//! acknowledged edit back into in-memory state.

use serde::Serialize;

use crate::merge::DedupKey;
use crate::model::{Override, OverrideMap, Settlement, Transaction};

/// Replacement values for one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditPatch {
    pub settlement: Settlement,
    pub security: Option<i64>,
    pub balance_payable: Option<i64>,
    pub remark: Option<String>,
}

/// Ledger create payload for a row that has never been persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializeRequest {
    pub invoice_no: String,
    pub loc_code: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub cash: f64,
    pub bank: f64,
    pub upi: f64,
    pub rbl: f64,
    pub amount: f64,
    pub total_transaction: f64,
    pub bill_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_amount: Option<f64>,
    #[serde(rename = "Balance", skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    pub customer_name: String,
    pub source: String,
}

impl MaterializeRequest {
    /// Deterministic initial split: the transaction's current values.
    pub fn from_transaction(txn: &Transaction) -> Self {
        Self {
            invoice_no: txn.invoice_key.trim().to_string(),
            loc_code: txn.location_code.clone(),
            date: txn.date_key(),
            kind: txn.category.as_str().to_string(),
            category: txn.sub_category.clone(),
            cash: to_major(txn.settlement.cash),
            bank: to_major(txn.settlement.bank),
            upi: to_major(txn.settlement.upi),
            rbl: to_major(txn.settlement.rbl),
            amount: to_major(txn.amount),
            total_transaction: to_major(txn.total_transaction),
            bill_value: to_major(txn.bill_value),
            security_amount: txn.rent_out.map(|l| to_major(l.security)),
            balance: txn.rent_out.map(|l| to_major(l.balance_payable)),
            customer_name: txn.customer_name.clone(),
            source: txn.source.to_string(),
        }
    }
}

/// Ledger update payload. Always marks the record as edited.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub invoice_no: String,
    pub cash: f64,
    pub bank: f64,
    pub upi: f64,
    pub rbl: f64,
    pub amount: f64,
    pub total_transaction: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_amount: Option<f64>,
    #[serde(rename = "Balance", skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    pub source: &'static str,
}

impl UpdateRequest {
    pub fn new(txn: &Transaction, patch: &EditPatch) -> Self {
        let edited = preview(txn, patch);
        Self {
            invoice_no: txn.invoice_key.trim().to_string(),
            cash: to_major(patch.settlement.cash),
            bank: to_major(patch.settlement.bank),
            upi: to_major(patch.settlement.upi),
            rbl: to_major(patch.settlement.rbl),
            amount: to_major(edited.amount),
            total_transaction: to_major(edited.total_transaction),
            security_amount: edited.rent_out.map(|l| to_major(l.security)),
            balance: edited.rent_out.map(|l| to_major(l.balance_payable)),
            remark: patch.remark.clone(),
            source: "edited",
        }
    }
}

/// The override equivalent of an acknowledged patch.
pub fn patch_override(txn: &Transaction, patch: &EditPatch) -> Override {
    Override {
        invoice_key: txn.invoice_key.trim().to_string(),
        settlement: patch.settlement,
        security: patch.security,
        balance_payable: patch.balance_payable,
        declared_total: None,
    }
}

/// What the transaction looks like once `patch` is applied.
pub fn preview(txn: &Transaction, patch: &EditPatch) -> Transaction {
    let mut out = crate::overrides::apply_override(txn, &patch_override(txn, patch));
    if let Some(ref remark) = patch.remark {
        out.remark = remark.clone();
    }
    out
}

pub fn find<'a>(txns: &'a [Transaction], key: &DedupKey) -> Option<&'a Transaction> {
    txns.iter().find(|t| DedupKey::of(t) == *key)
}

/// Record a materialized ledger id on the in-memory transaction.
/// Returns false when no transaction carries `key`.
pub fn attach_ledger_id(txns: &mut [Transaction], key: &DedupKey, id: &str) -> bool {
    match txns.iter_mut().find(|t| DedupKey::of(t) == *key) {
        Some(txn) => {
            txn.ledger_id = Some(id.to_string());
            true
        }
        None => false,
    }
}

/// Fold an acknowledged edit into in-memory state: replace the transaction
/// and register the override for subsequent merges.
pub fn commit_edit(
    txns: &mut [Transaction],
    overrides: &mut OverrideMap,
    key: &DedupKey,
    patch: &EditPatch,
) -> bool {
    let Some(txn) = txns.iter_mut().find(|t| DedupKey::of(t) == *key) else {
        return false;
    };
    let ov = patch_override(txn, patch);
    *txn = preview(txn, patch);
    overrides.insert(ov.invoice_key.clone(), ov);
    true
}

fn to_major(minor: i64) -> f64 {
    minor as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Provenance, RentOutLegs};
    use chrono::NaiveDate;

    fn booking() -> Transaction {
        let mut t = Transaction {
            invoice_key: "B-100".into(),
            location_code: "L01".into(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            category: Category::Booking,
            sub_category: "Advance".into(),
            sub_category1: None,
            settlement: Settlement { cash: 500000, ..Settlement::default() },
            rent_out: None,
            amount: 0,
            total_transaction: 0,
            bill_value: 1200000,
            customer_name: "Asha".into(),
            remark: String::new(),
            source: Provenance::Booking,
            ledger_id: None,
        };
        t.recompute_totals();
        t
    }

    #[test]
    fn materialize_uses_current_split() {
        let req = MaterializeRequest::from_transaction(&booking());
        assert_eq!(req.invoice_no, "B-100");
        assert_eq!(req.kind, "Booking");
        assert_eq!(req.category, "Advance");
        assert_eq!(req.cash, 5000.0);
        assert_eq!(req.total_transaction, 5000.0);
        assert_eq!(req.source, "booking");

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "Booking");
        assert_eq!(json["invoiceNo"], "B-100");
        assert_eq!(json["billValue"], 12000.0);
        assert!(json.get("Balance").is_none());
    }

    #[test]
    fn update_marks_edited_and_recomputes() {
        let patch = EditPatch {
            settlement: Settlement { cash: 300000, upi: 220000, ..Settlement::default() },
            ..EditPatch::default()
        };
        let req = UpdateRequest::new(&booking(), &patch);
        assert_eq!(req.source, "edited");
        assert_eq!(req.total_transaction, 5200.0);
        assert_eq!(req.upi, 2200.0);
    }

    #[test]
    fn rentout_update_carries_legs() {
        let mut t = booking();
        t.category = Category::RentOut;
        t.rent_out = Some(RentOutLegs { security: 1000, balance_payable: 2000 });
        let patch = EditPatch { balance_payable: Some(500), ..EditPatch::default() };
        let req = UpdateRequest::new(&t, &patch);
        assert_eq!(req.security_amount, Some(10.0));
        assert_eq!(req.balance, Some(5.0));
        assert_eq!(req.total_transaction, 15.0);
    }

    #[test]
    fn attach_and_commit() {
        let mut txns = vec![booking()];
        let key = DedupKey::of(&txns[0]);
        assert!(attach_ledger_id(&mut txns, &key, "66aa"));
        assert_eq!(txns[0].ledger_id.as_deref(), Some("66aa"));

        let mut overrides = OverrideMap::new();
        let patch = EditPatch {
            settlement: Settlement { cash: 100, ..Settlement::default() },
            remark: Some("recount".into()),
            ..EditPatch::default()
        };
        assert!(commit_edit(&mut txns, &mut overrides, &key, &patch));
        assert_eq!(txns[0].settlement.cash, 100);
        assert_eq!(txns[0].total_transaction, 100);
        assert_eq!(txns[0].remark, "recount");
        assert_eq!(txns[0].ledger_id.as_deref(), Some("66aa"));
        assert_eq!(overrides["B-100"].settlement.cash, 100);
    }

    #[test]
    fn missing_key_leaves_state_alone() {
        let mut txns = vec![booking()];
        let mut other = DedupKey::of(&txns[0]);
        other.invoice_key = "nope".into();
        let mut overrides = OverrideMap::new();
        assert!(!attach_ledger_id(&mut txns, &other, "x"));
        assert!(!commit_edit(&mut txns, &mut overrides, &other, &EditPatch::default()));
        assert!(overrides.is_empty());
        assert_eq!(txns[0], booking());
    }
}
