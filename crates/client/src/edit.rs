//! Two-phase edit flow.
//!
//! 1. `ensure_materialized`: a row that only exists in the booking API gets a
//!    ledger record created with its current split. Rows that already carry
//!    a ledger id are left alone.
//! 2. `apply_edit`: update the ledger record by id, then fold the patch into
//!    the in-memory transactions and the override map.
//!
//! In-memory state only changes after the collaborator acknowledged the
//! write, so a failed edit leaves the Day Book exactly as it was.

use stridebook_daybook::edit::{self, MaterializeRequest, UpdateRequest};
use stridebook_daybook::{DedupKey, EditPatch, OverrideMap, Transaction};

use crate::error::EditError;
use crate::source::LedgerWriter;

/// Result of a completed edit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub ledger_id: String,
    /// True when this edit created the ledger record.
    pub materialized: bool,
    pub transaction: Transaction,
}

/// Phase one. Returns the ledger id and whether it was just created.
pub fn ensure_materialized<W>(
    writer: &W,
    txns: &mut [Transaction],
    key: &DedupKey,
) -> Result<(String, bool), EditError>
where
    W: LedgerWriter + ?Sized,
{
    let txn = edit::find(txns, key).ok_or_else(|| EditError::NotFound(key.clone()))?;
    if let Some(id) = txn.ledger_id.clone() {
        return Ok((id, false));
    }

    let request = MaterializeRequest::from_transaction(txn);
    let id = writer
        .create(&request)
        .map_err(EditError::Materialize)?
        .ok_or_else(|| EditError::MissingId(key.clone()))?;

    edit::attach_ledger_id(txns, key, &id);
    tracing::info!(key = %key, id = %id, "materialized ledger record");
    Ok((id, true))
}

/// Phase two. `id` is the ledger record returned by phase one.
pub fn apply_edit<W>(
    writer: &W,
    txns: &mut [Transaction],
    overrides: &mut OverrideMap,
    key: &DedupKey,
    id: &str,
    patch: &EditPatch,
) -> Result<Transaction, EditError>
where
    W: LedgerWriter + ?Sized,
{
    let txn = edit::find(txns, key).ok_or_else(|| EditError::NotFound(key.clone()))?;
    let request = UpdateRequest::new(txn, patch);
    writer.update(id, &request).map_err(EditError::Update)?;

    edit::commit_edit(txns, overrides, key, patch);
    let updated = edit::find(txns, key)
        .cloned()
        .ok_or_else(|| EditError::NotFound(key.clone()))?;
    tracing::info!(key = %key, id, total = updated.total_transaction, "edit applied");
    Ok(updated)
}

/// Both phases in order.
pub fn edit_transaction<W>(
    writer: &W,
    txns: &mut [Transaction],
    overrides: &mut OverrideMap,
    key: &DedupKey,
    patch: &EditPatch,
) -> Result<EditOutcome, EditError>
where
    W: LedgerWriter + ?Sized,
{
    let (ledger_id, materialized) = ensure_materialized(writer, txns, key)?;
    let transaction = apply_edit(writer, txns, overrides, key, &ledger_id, patch)?;
    Ok(EditOutcome {
        ledger_id,
        materialized,
        transaction,
    })
}
