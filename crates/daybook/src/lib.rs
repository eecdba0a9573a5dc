//! `stridebook-daybook`: Day Book reconciliation engine.
//!
//! Pure engine crate: receives pre-fetched source rows, returns one merged,
//! deduplicated Day Book with totals and cash closing. No network or CLI
//! dependencies.

pub mod balance;
pub mod coerce;
pub mod config;
pub mod denomination;
pub mod edit;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod opening;
pub mod overrides;

pub use balance::Filter;
pub use config::DayBookConfig;
pub use denomination::DenominationCount;
pub use edit::EditPatch;
pub use engine::{refresh, run, DayBookInput, DayBookParams};
pub use error::DayBookError;
pub use merge::DedupKey;
pub use model::{
    Category, DayBook, OpeningBalance, Override, OverrideMap, Provenance, Settlement,
    SourceFailure, SourceKind, Transaction,
};
