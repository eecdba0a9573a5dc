//! Ledger Normalizer: internal payment-ledger rows into [`Transaction`]s.
//!
//! Rows are filtered through a category allow-list first; anything else
//! (non-financial or malformed entries) is silently dropped. Labels are
//! compared the way [`Category::parse`] reads them, so "MoneyTransfer",
//! "money transfer" and "Money-Transfer" are one category.
//! Category and sub-category are taken from the row's `type` and `category`
//! fields as-is rather than recomputed. Return and Cancel rows still obey
//! the refund sign and RBL rules of the booking feeds.

use std::collections::HashSet;

use serde_json::Value;

use crate::coerce;
use crate::model::{Category, Provenance, RentOutLegs, Settlement, Transaction};
use crate::normalize::refund_split;

const ID: &[&str] = &["_id"];
const INVOICE: &[&str] = &["invoiceNo"];
const LOCATION: &[&str] = &["locCode"];
const DATE: &[&str] = &["date", "createdAt"];
const TYPE: &[&str] = &["type"];
const CATEGORY: &[&str] = &["category"];
const BILL_VALUE: &[&str] = &["billValue", "amount"];

/// Case-insensitive set of ledger categories admitted into the Day Book.
#[derive(Debug, Clone)]
pub struct AllowList {
    folded: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            folded: labels
                .into_iter()
                .filter(|s| !s.as_ref().trim().is_empty())
                .map(|s| fold(s.as_ref()))
                .collect(),
        }
    }

    pub fn permits(&self, label: &str) -> bool {
        !label.trim().is_empty() && self.folded.contains(&fold(label))
    }

    pub fn len(&self) -> usize {
        self.folded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folded.is_empty()
    }
}

fn fold(label: &str) -> String {
    Category::parse(label).key()
}

/// Normalize allow-listed ledger rows.
pub fn normalize_ledger(rows: &[Value], allow: &AllowList) -> Vec<Transaction> {
    let out: Vec<Transaction> = rows
        .iter()
        .filter(|row| allow.permits(&coerce::text(row, TYPE)))
        .filter_map(normalize_ledger_row)
        .collect();
    tracing::debug!(source = "ledger", rows = out.len(), skipped = rows.len() - out.len(), "normalized");
    out
}

/// Convert one ledger row, ignoring the allow-list. `None` without a date.
pub fn normalize_ledger_row(row: &Value) -> Option<Transaction> {
    let date = coerce::first_date(row, DATE)?;
    let ledger_id = coerce::first_text(row, ID);

    let invoice_key = coerce::first_text(row, INVOICE)
        .or_else(|| ledger_id.clone())
        .or_else(|| coerce::first_text(row, LOCATION))
        .unwrap_or_default();

    let category = Category::parse(&coerce::text(row, TYPE));
    let rent_out = (category == Category::RentOut).then(|| RentOutLegs {
        security: coerce::amount(row, &["securityAmount"]),
        balance_payable: coerce::amount(row, &["Balance"]),
    });

    let source = if coerce::text(row, &["source"]).eq_ignore_ascii_case("edited") {
        Provenance::Edited
    } else {
        Provenance::Ledger
    };

    let mut settlement = Settlement {
        cash: coerce::amount(row, &["cash"]),
        bank: coerce::amount(row, &["bank"]),
        upi: coerce::amount(row, &["upi"]),
        rbl: coerce::amount(row, &["rbl"]),
    };
    if category.is_refund() {
        settlement = refund_split(settlement);
    }

    let mut txn = Transaction {
        invoice_key,
        location_code: coerce::text(row, LOCATION),
        date,
        sub_category: coerce::text(row, CATEGORY),
        sub_category1: rent_out.map(|_| "Balance Payable".to_string()),
        category,
        settlement,
        rent_out,
        amount: 0,
        total_transaction: 0,
        bill_value: coerce::amount(row, BILL_VALUE),
        customer_name: coerce::text(row, &["customerName"]),
        remark: coerce::text(row, &["remark"]),
        source,
        ledger_id,
    };
    txn.recompute_totals();
    Some(txn)
}
