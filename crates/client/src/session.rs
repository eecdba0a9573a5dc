//! Reconciliation session.
//!
//! Every `reconcile` call takes a new generation number before it starts
//! fetching. When the fetches settle, a result whose generation is no longer
//! the latest is discarded as `Superseded`, so a slow request for an old
//! date range can never overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use stridebook_daybook::{
    refresh, run, DayBook, DayBookConfig, DayBookError, DayBookParams, DedupKey, EditPatch,
    OverrideMap,
};

use crate::edit::{apply_edit, ensure_materialized, EditOutcome};
use crate::error::EditError;
use crate::fanout::gather;
use crate::source::{DateWindow, DayBookSource, LedgerWriter};

#[derive(Debug)]
pub enum Reconciled {
    Current(Box<DayBook>),
    /// A newer request started while this one was in flight.
    Superseded,
}

impl Reconciled {
    pub fn current(self) -> Option<DayBook> {
        match self {
            Reconciled::Current(book) => Some(*book),
            Reconciled::Superseded => None,
        }
    }
}

pub struct DayBookSession<S> {
    source: S,
    config: DayBookConfig,
    generation: AtomicU64,
    /// Edits acknowledged in this session, layered over fetched overrides.
    local_overrides: Mutex<OverrideMap>,
}

impl<S: DayBookSource> DayBookSession<S> {
    pub fn new(source: S, config: DayBookConfig) -> Self {
        Self {
            source,
            config,
            generation: AtomicU64::new(0),
            local_overrides: Mutex::new(OverrideMap::new()),
        }
    }

    pub fn config(&self) -> &DayBookConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch, merge and total one window. Safe to call from several threads;
    /// only the most recently started call returns `Current`.
    pub fn reconcile(&self, window: &DateWindow, params: &DayBookParams) -> Result<Reconciled, DayBookError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut input = gather(&self.source, &self.config, window);

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, location = %window.location_code, "stale result discarded");
            return Ok(Reconciled::Superseded);
        }

        {
            let local = self.local_overrides.lock().unwrap_or_else(PoisonError::into_inner);
            input
                .overrides
                .extend(local.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let book = run(&self.config, &input, params)?;
        Ok(Reconciled::Current(Box::new(book)))
    }

    /// Apply one edit to `book` through `writer`, then refresh its totals.
    /// On error `book` is unchanged. The ledger writes run without holding
    /// the session's override lock, so concurrent `reconcile` calls proceed.
    pub fn edit<W>(
        &self,
        writer: &W,
        book: &mut DayBook,
        key: &DedupKey,
        patch: &EditPatch,
        params: &DayBookParams,
    ) -> Result<EditOutcome, EditError>
    where
        W: LedgerWriter + ?Sized,
    {
        let (ledger_id, materialized) = ensure_materialized(writer, &mut book.transactions, key)?;
        let mut staged = OverrideMap::new();
        let transaction = apply_edit(writer, &mut book.transactions, &mut staged, key, &ledger_id, patch)?;

        self.local_overrides
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(staged);
        refresh(book, params);
        Ok(EditOutcome {
            ledger_id,
            materialized,
            transaction,
        })
    }
}
