//! One reconciliation pass over already-fetched inputs.
//!
//! Normalizes each feed, merges in ledger and override precedence order,
//! then totals the result. `refresh` recomputes the derived figures of an
//! existing Day Book after an in-place edit.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value;

use crate::balance::{cash_closing, category_breakdown, compute_totals, Filter};
use crate::config::DayBookConfig;
use crate::error::DayBookError;
use crate::ledger::normalize_ledger;
use crate::merge::merge;
use crate::model::{
    CashClosing, DayBook, OpeningBalance, OverrideMap, SourceFailure, SourceKind, Totals, Transaction,
};
use crate::normalize::normalize_source;
use crate::opening::resolve_opening_date;

/// Everything gathered for one reconciliation pass. A feed that failed
/// arrives empty, with a matching entry in `failures`.
#[derive(Debug, Clone, Default)]
pub struct DayBookInput {
    pub location_code: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Raw rows per booking-API feed and for the ledger.
    pub feeds: BTreeMap<SourceKind, Vec<Value>>,
    pub overrides: OverrideMap,
    /// `None` when there is no prior close (or the lookup failed).
    pub opening: Option<OpeningBalance>,
    pub failures: Vec<SourceFailure>,
}

/// Presentation-independent knobs for one run.
#[derive(Debug, Clone, Default)]
pub struct DayBookParams {
    pub filter: Filter,
    /// Counted drawer cash, if the user entered one.
    pub physical_cash: Option<i64>,
}

/// Merge order of the normalized lists.
const MERGE_ORDER: [SourceKind; 5] = [
    SourceKind::Booking,
    SourceKind::RentOut,
    SourceKind::Return,
    SourceKind::Cancel,
    SourceKind::Ledger,
];

/// Run one reconciliation pass over pre-fetched inputs.
pub fn run(
    config: &DayBookConfig,
    input: &DayBookInput,
    params: &DayBookParams,
) -> Result<DayBook, DayBookError> {
    if input.from > input.to {
        return Err(DayBookError::DateRange {
            from: input.from.to_string(),
            to: input.to.to_string(),
        });
    }

    let allow = config.ledger.allow_list();
    let mut source_counts = BTreeMap::new();
    let mut lists: Vec<Vec<Transaction>> = Vec::with_capacity(MERGE_ORDER.len());

    for kind in MERGE_ORDER {
        let rows = input.feeds.get(&kind).map(Vec::as_slice).unwrap_or(&[]);
        let normalized = match kind {
            SourceKind::Ledger => normalize_ledger(rows, &allow),
            _ => normalize_source(kind, rows),
        };
        source_counts.insert(kind, normalized.len());
        lists.push(normalized);
    }
    source_counts.insert(SourceKind::Overrides, input.overrides.len());

    let transactions = merge(lists, &input.overrides);

    let mut book = DayBook {
        location_code: input.location_code.clone(),
        from: input.from,
        to: input.to,
        opening_date: resolve_opening_date(input.from, config.opening.epoch),
        opening: input.opening.unwrap_or_default(),
        transactions,
        totals: Totals::default(),
        closing: CashClosing::default(),
        breakdown: Vec::new(),
        source_counts,
        degraded: input.failures.clone(),
    };
    refresh(&mut book, params);

    tracing::info!(
        location = %book.location_code,
        from = %book.from,
        to = %book.to,
        transactions = book.transactions.len(),
        closing_cash = book.closing.closing_cash,
        degraded = book.degraded.len(),
        "day book reconciled"
    );
    Ok(book)
}

/// Recompute totals, closing and breakdown from `book.transactions`.
/// Used after an in-place edit and after a filter change.
pub fn refresh(book: &mut DayBook, params: &DayBookParams) {
    book.totals = compute_totals(&book.transactions, &book.opening, &params.filter);
    book.closing = cash_closing(&book.totals, &book.opening, params.physical_cash);
    book.breakdown = category_breakdown(&book.transactions, &params.filter);
}

impl DayBook {
    /// Transactions admitted by `filter`, in merge order.
    pub fn filtered<'a>(&'a self, filter: &'a Filter) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.transactions.iter().filter(move |t| filter.admits(t))
    }
}
