//! Opening-Balance Chain.
//!
//! The opening balance for a date is the previous day's persisted closing
//! snapshot, floored at a fixed epoch. Exactly one prior-day lookup; the
//! chain never walks backward through missing days.

use chrono::{Days, NaiveDate};
use serde_json::Value;

use crate::coerce;
use crate::model::OpeningBalance;

/// Earliest date the chain will ever look up.
pub fn default_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// `max(requested - 1 day, epoch)`.
pub fn resolve_opening_date(requested: NaiveDate, epoch: NaiveDate) -> NaiveDate {
    requested
        .checked_sub_days(Days::new(1))
        .map_or(epoch, |prev| prev.max(epoch))
}

/// Read a snapshot from the opening-balance API's `data` object.
/// Missing fields read as 0.
pub fn parse_opening(data: &Value) -> OpeningBalance {
    OpeningBalance {
        closing_cash: coerce::amount(data, &["closingCash", "cash"]),
        bank: coerce::amount(data, &["bank", "closingBank"]),
        rbl: coerce::amount(data, &["rbl", "closingRbl"]),
    }
}
