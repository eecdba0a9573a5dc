//! Balance Calculator: filter, per-column totals, cash closing.
//!
//! Carry-forward chain: today's opening cash is yesterday's closing cash,
//! so `Totals::cash` = opening cash + sum of the cash channel.

use std::collections::BTreeMap;

use crate::model::{
    CashClosing, Category, CategoryBreakdown, OpeningBalance, Settlement, Totals, Transaction,
};

/// Category / sub-category filter. `"all"` (or empty) bypasses a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub category: Option<String>,
    pub sub_category: Option<String>,
}

impl Filter {
    pub fn new(category: &str, sub_category: &str) -> Self {
        Self {
            category: active(category),
            sub_category: active(sub_category),
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn admits(&self, txn: &Transaction) -> bool {
        if let Some(ref wanted) = self.category {
            if !txn.category.matches(wanted) {
                return false;
            }
        }
        if let Some(ref wanted) = self.sub_category {
            let on_sub = txn.sub_category.trim().eq_ignore_ascii_case(wanted);
            let on_sub1 = txn.category == Category::RentOut
                && txn
                    .sub_category1
                    .as_deref()
                    .is_some_and(|s| s.trim().eq_ignore_ascii_case(wanted));
            if !on_sub && !on_sub1 {
                return false;
            }
        }
        true
    }
}

fn active(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Sum every column over the filtered set and fold in the opening cash.
pub fn compute_totals(txns: &[Transaction], opening: &OpeningBalance, filter: &Filter) -> Totals {
    let mut totals = Totals::default();
    for txn in txns.iter().filter(|t| filter.admits(t)) {
        totals.cash = totals.cash.saturating_add(txn.settlement.cash);
        totals.bank = totals.bank.saturating_add(txn.settlement.bank);
        totals.upi = totals.upi.saturating_add(txn.settlement.upi);
        totals.rbl = totals.rbl.saturating_add(txn.settlement.rbl);
        totals.total_transaction = totals.total_transaction.saturating_add(txn.total_transaction);
        if let Some(legs) = txn.rent_out {
            totals.security = totals.security.saturating_add(legs.security);
            totals.balance_payable = totals.balance_payable.saturating_add(legs.balance_payable);
        }
    }
    totals.cash = totals.cash.saturating_add(opening.closing_cash);
    totals
}

/// Closing cash is the computed cash total; the difference against a
/// physical count is `physical - closing` (positive = surplus).
pub fn cash_closing(totals: &Totals, opening: &OpeningBalance, physical_cash: Option<i64>) -> CashClosing {
    CashClosing {
        opening_cash: opening.closing_cash,
        closing_cash: totals.cash,
        physical_cash,
        difference: physical_cash.map(|p| p.saturating_sub(totals.cash)),
    }
}

/// Count and channel sums per category over the filtered set, sorted by
/// category label.
pub fn category_breakdown(txns: &[Transaction], filter: &Filter) -> Vec<CategoryBreakdown> {
    let mut groups: BTreeMap<String, (usize, Settlement, i64)> = BTreeMap::new();
    for txn in txns.iter().filter(|t| filter.admits(t)) {
        let entry = groups
            .entry(txn.category.as_str().to_string())
            .or_insert((0, Settlement::default(), 0));
        entry.0 += 1;
        entry.1 += txn.settlement;
        entry.2 = entry.2.saturating_add(txn.total_transaction);
    }
    groups
        .into_iter()
        .map(|(category, (count, settlement, total_transaction))| CategoryBreakdown {
            category,
            count,
            settlement,
            total_transaction,
        })
        .collect()
}
