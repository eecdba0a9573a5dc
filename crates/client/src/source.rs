//! Collaborator seams. The reconciliation path only needs these traits;
//! `DayBookApi` is the HTTP implementation and tests plug in fakes.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use stridebook_daybook::edit::{MaterializeRequest, UpdateRequest};
use stridebook_daybook::SourceKind;

use crate::error::FetchError;

/// Location + inclusive date range, as every read endpoint expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    pub location_code: String,
    #[serde(with = "iso_date")]
    pub date_from: NaiveDate,
    #[serde(with = "iso_date")]
    pub date_to: NaiveDate,
}

impl DateWindow {
    pub fn new(location_code: impl Into<String>, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            location_code: location_code.into(),
            date_from: from,
            date_to: to,
        }
    }
}

mod iso_date {
    use chrono::NaiveDate;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format("%Y-%m-%d"))
    }
}

/// Read side of a reconciliation pass. Implementations must be safe to call
/// from several threads at once.
pub trait DayBookSource: Sync {
    /// Raw rows of one booking-API feed (`Booking`, `RentOut`, `Return`,
    /// `Cancel`) or the ledger (`Ledger`).
    fn fetch_rows(&self, kind: SourceKind, window: &DateWindow) -> Result<Vec<Value>, FetchError>;

    /// Raw override rows for the window.
    fn fetch_overrides(&self, window: &DateWindow) -> Result<Vec<Value>, FetchError>;

    /// The persisted closing snapshot for `date`, `None` when there is none.
    fn fetch_opening(&self, location_code: &str, date: NaiveDate) -> Result<Option<Value>, FetchError>;
}

/// Write side of the edit path.
pub trait LedgerWriter {
    /// Create a ledger record and return its id.
    fn create(&self, request: &MaterializeRequest) -> Result<Option<String>, FetchError>;

    /// Update a ledger record by id.
    fn update(&self, id: &str, request: &UpdateRequest) -> Result<(), FetchError>;
}
