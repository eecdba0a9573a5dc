//! Physical cash from a drawer denomination count.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;

use crate::error::DayBookError;

/// Accepted INR notes and coins, in rupees.
pub const DENOMINATIONS: [u32; 9] = [500, 200, 100, 50, 20, 10, 5, 2, 1];

/// Count of notes/coins per denomination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DenominationCount {
    counts: BTreeMap<u32, u32>,
}

impl DenominationCount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` pieces of `denomination` rupees.
    pub fn add(&mut self, denomination: u32, count: u32) -> Result<(), DayBookError> {
        if !DENOMINATIONS.contains(&denomination) {
            return Err(DayBookError::UnknownDenomination(denomination));
        }
        let slot = self.counts.entry(denomination).or_insert(0);
        *slot = slot.checked_add(count).ok_or_else(|| {
            DayBookError::ConfigValidation(format!("too many {denomination} pieces"))
        })?;
        Ok(())
    }

    /// Total in minor units (paise).
    pub fn total_minor(&self) -> i64 {
        self.counts
            .iter()
            .map(|(denom, count)| *denom as i64 * *count as i64 * 100)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.values().all(|c| *c == 0)
    }
}

/// Parse `"500=3"` style entries.
impl FromStr for DenominationCount {
    type Err = DayBookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut count = DenominationCount::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (denom, n) = entry.split_once('=').ok_or_else(|| {
                DayBookError::ConfigValidation(format!("expected DENOM=COUNT, got '{entry}'"))
            })?;
            let denom: u32 = denom.trim().parse().map_err(|_| {
                DayBookError::ConfigValidation(format!("bad denomination in '{entry}'"))
            })?;
            let n: u32 = n.trim().parse().map_err(|_| {
                DayBookError::ConfigValidation(format!("bad count in '{entry}'"))
            })?;
            count.add(denom, n)?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_in_paise() {
        let mut c = DenominationCount::new();
        c.add(500, 3).unwrap();
        c.add(10, 4).unwrap();
        c.add(500, 1).unwrap();
        assert_eq!(c.total_minor(), (2000 + 40) * 100);
    }

    #[test]
    fn rejects_unknown_denomination() {
        let mut c = DenominationCount::new();
        let err = c.add(2000, 1).unwrap_err();
        assert!(err.to_string().contains("2000"));
    }

    #[test]
    fn count_overflow_is_an_error() {
        let err = "500=4294967295,500=1".parse::<DenominationCount>().unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn parses_entries() {
        let c: DenominationCount = "500=2, 100=3,1=7".parse().unwrap();
        assert_eq!(c.total_minor(), (1000 + 300 + 7) * 100);
        assert!("500".parse::<DenominationCount>().is_err());
        assert!("500=x".parse::<DenominationCount>().is_err());
        assert!("".parse::<DenominationCount>().unwrap().is_empty());
    }
}
