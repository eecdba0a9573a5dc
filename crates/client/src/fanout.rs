//! Fan-out/fan-in gather of every source for one reconciliation pass.
//!
//! Seven independent fetches run on scoped threads: four booking-API feeds,
//! the ledger, the override store and the opening balance. The join is the
//! barrier. A fetch that errors (or panics) degrades to its empty value and
//! is recorded as a `SourceFailure`; siblings are never cancelled.

use std::any::Any;
use std::collections::BTreeMap;
use std::thread;

use stridebook_daybook::opening::{parse_opening, resolve_opening_date};
use stridebook_daybook::overrides::build_override_map;
use stridebook_daybook::{DayBookConfig, DayBookInput, SourceFailure, SourceKind};

use crate::error::FetchError;
use crate::source::{DateWindow, DayBookSource};

/// Feeds fetched as raw rows, in merge order.
const ROW_FEEDS: [SourceKind; 5] = [
    SourceKind::Booking,
    SourceKind::RentOut,
    SourceKind::Return,
    SourceKind::Cancel,
    SourceKind::Ledger,
];

/// Fetch everything for `window` concurrently. Never fails.
pub fn gather<S>(source: &S, config: &DayBookConfig, window: &DateWindow) -> DayBookInput
where
    S: DayBookSource + ?Sized,
{
    let opening_date = resolve_opening_date(window.date_from, config.opening.epoch);
    let mut failures = Vec::new();

    let (feeds, override_rows, opening) = thread::scope(|scope| {
        let row_handles: Vec<_> = ROW_FEEDS
            .iter()
            .map(|&kind| (kind, scope.spawn(move || source.fetch_rows(kind, window))))
            .collect();
        let overrides = scope.spawn(|| source.fetch_overrides(window));
        let opening = scope.spawn(|| source.fetch_opening(&window.location_code, opening_date));

        let mut feeds = BTreeMap::new();
        for (kind, handle) in row_handles {
            feeds.insert(kind, settle(kind, handle.join(), &mut failures));
        }
        let override_rows = settle(SourceKind::Overrides, overrides.join(), &mut failures);
        let opening = settle(SourceKind::Opening, opening.join(), &mut failures);
        (feeds, override_rows, opening)
    });

    DayBookInput {
        location_code: window.location_code.clone(),
        from: window.date_from,
        to: window.date_to,
        feeds,
        overrides: build_override_map(&override_rows),
        opening: opening.as_ref().map(parse_opening),
        failures,
    }
}

/// Unwrap one joined fetch, substituting the default on any failure.
fn settle<T: Default>(
    kind: SourceKind,
    joined: Result<Result<T, FetchError>, Box<dyn Any + Send>>,
    failures: &mut Vec<SourceFailure>,
) -> T {
    let reason = match joined {
        Ok(Ok(value)) => return value,
        Ok(Err(e)) => e.to_string(),
        Err(panic) => format!("fetch panicked: {}", panic_message(&*panic)),
    };
    tracing::warn!(source = %kind, reason = %reason, "source unavailable, continuing without it");
    failures.push(SourceFailure { source: kind, reason });
    T::default()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
