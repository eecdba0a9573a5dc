//! `stridebook-client`: collaborators around the Day Book engine.
//!
//! Blocking HTTP access to the booking, ledger, override and opening-balance
//! APIs, the concurrent gather that feeds one reconciliation pass, the
//! superseding session, and the two-phase edit flow.

pub mod api;
pub mod edit;
pub mod error;
pub mod fanout;
pub mod http;
pub mod session;
pub mod source;

#[cfg(test)]
mod testing;

pub use api::DayBookApi;
pub use edit::{apply_edit, edit_transaction, ensure_materialized, EditOutcome};
pub use error::{EditError, FetchError};
pub use fanout::gather;
pub use http::{HttpClient, RetryPolicy};
pub use session::{DayBookSession, Reconciled};
pub use source::{DateWindow, DayBookSource, LedgerWriter};
