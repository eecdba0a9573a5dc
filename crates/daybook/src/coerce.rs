//! Lenient field readers for raw JSON rows.
//!
//! Upstream payloads mix numbers, numeric strings, nulls and garbage in the
//! same columns. Nothing here fails: amounts fall back to 0, strings to "",
//! dates to `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Convert a JSON value to its string form. Null becomes "".
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// First field in `names` whose value is present and non-blank, trimmed.
pub fn first_text(row: &Value, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        let text = value_to_string(row.get(*name)?);
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Text field or "".
pub fn text(row: &Value, names: &[&str]) -> String {
    first_text(row, names).unwrap_or_default()
}

/// Amount in minor units from the first present field; 0 when absent or
/// unparsable.
pub fn amount(row: &Value, names: &[&str]) -> i64 {
    optional_amount(row, names).unwrap_or(0)
}

/// Amount in minor units, distinguishing "absent" from "zero".
pub fn optional_amount(row: &Value, names: &[&str]) -> Option<i64> {
    let raw = first_text(row, names)?;
    Some(parse_minor(&raw).unwrap_or(0))
}

/// Largest accepted magnitude in minor units (one trillion rupees).
/// Anything beyond it is treated as malformed.
pub const MAX_ABS_MINOR: i64 = 100_000_000_000_000;

/// Parse a decimal amount string to i64 minor units (paise).
/// Handles "1234.56", "1234.5", "1234", "-1234.56", "1,234.50", "1e3".
/// Digits past the second decimal place round half away from zero.
/// Magnitudes above [`MAX_ABS_MINOR`] are rejected.
pub fn parse_minor(s: &str) -> Option<i64> {
    parse_unbounded(s).filter(|minor| minor.unsigned_abs() <= MAX_ABS_MINOR as u64)
}

fn parse_unbounded(s: &str) -> Option<i64> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.contains(['e', 'E']) {
        let f: f64 = cleaned.parse().ok()?;
        let minor = (f * 100.0).round();
        if !minor.is_finite() || minor.abs() > MAX_ABS_MINOR as f64 {
            return None;
        }
        return Some(minor as i64);
    }

    let (negative, unsigned) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };
    if unsigned.is_empty() {
        return None;
    }

    let (whole, frac) = match unsigned.find('.') {
        Some(dot) => (&unsigned[..dot], &unsigned[dot + 1..]),
        None => (unsigned, ""),
    };
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if whole.is_empty() && frac.is_empty() {
        return None;
    }

    let rupees: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let digits: Vec<u32> = frac.chars().filter_map(|c| c.to_digit(10)).collect();
    let mut paise = (*digits.first().unwrap_or(&0) as i64) * 10 + *digits.get(1).unwrap_or(&0) as i64;
    if digits.get(2).is_some_and(|d| *d >= 5) {
        paise += 1;
    }

    let minor = rupees.checked_mul(100)?.checked_add(paise)?;
    Some(if negative { -minor } else { minor })
}

/// Parse a calendar date, discarding time-of-day.
/// Accepts `YYYY-MM-DD`, RFC 3339 and naive `YYYY-MM-DDTHH:MM:SS[.fff]`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    // Last resort: a leading ISO date followed by anything.
    raw.get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
}

/// Date from the first field in `names` that holds a parsable date.
pub fn first_date(row: &Value, names: &[&str]) -> Option<NaiveDate> {
    names.iter().find_map(|name| {
        let text = value_to_string(row.get(*name)?);
        parse_date(&text)
    })
}
