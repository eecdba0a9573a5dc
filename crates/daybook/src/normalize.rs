//! Source Normalizers: booking-API rows into [`Transaction`]s.
//!
//! Each of the four booking-API feeds has one static [`FieldMap`] naming the
//! upstream fields to read, consulted once per row. Sign conventions:
//! - Booking, RentOut: amounts as received (inflows positive).
//! - Return, Cancel: every channel forced to `-abs(v)`; when the RBL channel
//!   is non-zero, bank and UPI are zeroed for that row.
//!
//! Pure: no IO, never fails. Unparsable amounts read as 0; rows without any
//! parsable date are dropped (they cannot be placed on a day).

use serde_json::Value;

use crate::coerce;
use crate::model::{Category, Provenance, RentOutLegs, Settlement, SourceKind, Transaction};

/// Upstream field names for one booking-API feed. For every list, the first
/// present, non-blank field wins.
#[derive(Debug)]
pub struct FieldMap {
    pub kind: SourceKind,
    pub invoice: &'static [&'static str],
    pub internal_id: &'static [&'static str],
    pub location: &'static [&'static str],
    pub date: &'static [&'static str],
    pub cash: &'static [&'static str],
    pub bank: &'static [&'static str],
    pub upi: &'static [&'static str],
    pub rbl: &'static [&'static str],
    pub bill_value: &'static [&'static str],
    pub customer: &'static [&'static str],
}

const INVOICE: &[&str] = &["invoiceNo"];
const LOCATION: &[&str] = &["locCode"];
const BILL_VALUE: &[&str] = &["invoiceAmount"];
const CUSTOMER: &[&str] = &["customerName"];

pub static BOOKING_FIELDS: FieldMap = FieldMap {
    kind: SourceKind::Booking,
    invoice: INVOICE,
    internal_id: &["bookingId", "id"],
    location: LOCATION,
    date: &["bookingDate", "createdDate"],
    cash: &["bookingCashAmount"],
    bank: &["bookingBankAmount"],
    upi: &["bookingUPIAmount"],
    rbl: &["bookingRBLAmount", "rblRazorPay"],
    bill_value: BILL_VALUE,
    customer: CUSTOMER,
};

pub static RENTOUT_FIELDS: FieldMap = FieldMap {
    kind: SourceKind::RentOut,
    invoice: INVOICE,
    internal_id: &["rentoutId", "id"],
    location: LOCATION,
    date: &["rentOutDate", "bookingDate", "createdDate"],
    cash: &["rentoutCashAmount"],
    bank: &["rentoutBankAmount"],
    upi: &["rentoutUPIAmount"],
    rbl: &["rentoutRBLAmount", "rblRazorPay"],
    bill_value: BILL_VALUE,
    customer: CUSTOMER,
};

pub static RETURN_FIELDS: FieldMap = FieldMap {
    kind: SourceKind::Return,
    invoice: INVOICE,
    internal_id: &["returnId", "id"],
    location: LOCATION,
    date: &["returnedDate", "returnDate", "createdDate"],
    cash: &["returnCashAmount"],
    bank: &["returnBankAmount"],
    upi: &["returnUPIAmount"],
    rbl: &["returnRBLAmount", "rblRazorPay"],
    bill_value: BILL_VALUE,
    customer: CUSTOMER,
};

pub static CANCEL_FIELDS: FieldMap = FieldMap {
    kind: SourceKind::Cancel,
    invoice: INVOICE,
    internal_id: &["deleteId", "id"],
    location: LOCATION,
    date: &["cancelDate", "deletedDate", "createdDate"],
    cash: &["deleteCashAmount"],
    bank: &["deleteBankAmount"],
    upi: &["deleteUPIAmount"],
    rbl: &["deleteRBLAmount", "rblRazorPay"],
    bill_value: BILL_VALUE,
    customer: CUSTOMER,
};

const SECURITY: &[&str] = &["securityAmount"];
const ADVANCE: &[&str] = &["advanceAmount"];

/// Field table for a booking-API feed; `None` for ledger/override/opening.
pub fn field_map(kind: SourceKind) -> Option<&'static FieldMap> {
    match kind {
        SourceKind::Booking => Some(&BOOKING_FIELDS),
        SourceKind::RentOut => Some(&RENTOUT_FIELDS),
        SourceKind::Return => Some(&RETURN_FIELDS),
        SourceKind::Cancel => Some(&CANCEL_FIELDS),
        SourceKind::Ledger | SourceKind::Overrides | SourceKind::Opening => None,
    }
}

/// Normalize one feed's raw rows. Non booking-API kinds yield nothing.
pub fn normalize_source(kind: SourceKind, rows: &[Value]) -> Vec<Transaction> {
    match field_map(kind) {
        Some(map) => normalize(map, rows),
        None => Vec::new(),
    }
}

pub fn normalize(map: &FieldMap, rows: &[Value]) -> Vec<Transaction> {
    let out: Vec<Transaction> = rows.iter().filter_map(|row| normalize_row(map, row)).collect();
    if out.len() != rows.len() {
        tracing::warn!(
            source = %map.kind,
            dropped = rows.len() - out.len(),
            "rows without a usable date dropped"
        );
    }
    tracing::debug!(source = %map.kind, rows = out.len(), "normalized");
    out
}

/// Invoice number, else internal record id, else location code, else "".
pub fn invoice_key(row: &Value, map: &FieldMap) -> String {
    coerce::first_text(row, map.invoice)
        .or_else(|| coerce::first_text(row, map.internal_id))
        .or_else(|| coerce::first_text(row, map.location))
        .unwrap_or_default()
}

pub fn normalize_row(map: &FieldMap, row: &Value) -> Option<Transaction> {
    let date = coerce::first_date(row, map.date)?;

    let mut settlement = Settlement {
        cash: coerce::amount(row, map.cash),
        bank: coerce::amount(row, map.bank),
        upi: coerce::amount(row, map.upi),
        rbl: coerce::amount(row, map.rbl),
    };
    let bill_value = coerce::amount(row, map.bill_value);

    let (category, sub_category, sub_category1, provenance, rent_out) = match map.kind {
        SourceKind::RentOut => {
            let security = coerce::amount(row, SECURITY);
            let balance_payable = bill_value.saturating_sub(coerce::amount(row, ADVANCE));
            (
                Category::RentOut,
                "Security",
                Some("Balance Payable".to_string()),
                Provenance::RentOut,
                Some(RentOutLegs { security, balance_payable }),
            )
        }
        SourceKind::Return => {
            settlement = refund_split(settlement);
            (Category::Return, "Security Refund", None, Provenance::Return, None)
        }
        SourceKind::Cancel => {
            settlement = refund_split(settlement);
            (Category::Cancel, "Cancellation Refund", None, Provenance::Deleted, None)
        }
        _ => (Category::Booking, "Advance", None, Provenance::Booking, None),
    };

    let mut txn = Transaction {
        invoice_key: invoice_key(row, map),
        location_code: coerce::text(row, map.location),
        date,
        category,
        sub_category: sub_category.to_string(),
        sub_category1,
        settlement,
        rent_out,
        amount: 0,
        total_transaction: 0,
        bill_value,
        customer_name: coerce::text(row, map.customer),
        remark: String::new(),
        source: provenance,
        ledger_id: None,
    };
    txn.recompute_totals();
    Some(txn)
}

/// Refund sign convention plus RBL exclusivity: an RBL-routed refund is
/// assumed to exclude bank and UPI for the same row.
pub fn refund_split(raw: Settlement) -> Settlement {
    let rbl = refund(raw.rbl);
    let (bank, upi) = if rbl != 0 {
        (0, 0)
    } else {
        (refund(raw.bank), refund(raw.upi))
    };
    Settlement {
        cash: refund(raw.cash),
        bank,
        upi,
        rbl,
    }
}

/// `-|value|`, saturating instead of overflowing on `i64::MIN`.
fn refund(value: i64) -> i64 {
    value.saturating_abs().saturating_neg()
}
