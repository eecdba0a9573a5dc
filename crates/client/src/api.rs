//! HTTP implementation of the collaborator traits.
//!
//! | Call | Method + path | Payload | Rows at |
//! |------|---------------|---------|---------|
//! | booking feeds | `POST {booking}/GetBookingList` (`GetRentoutList`, `GetReturnList`, `GetDeleteList`) | `{locationCode,dateFrom,dateTo}` | `dataSet.data` |
//! | ledger | `GET {ledger}/transactions` | query `locationCode,dateFrom,dateTo` | `data` |
//! | overrides | `GET {ledger}/overrides` | query `dateFrom,dateTo,locationCode` | `data` |
//! | opening | `GET {ledger}/closing-balance` | query `locationCode,date` | `data` (404 = none) |
//! | create | `POST {ledger}/transactions` | `MaterializeRequest` | `data._id` |
//! | update | `PUT {ledger}/transactions/{id}` | `UpdateRequest` | ack |

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Url;
use serde_json::Value;

use stridebook_daybook::config::ApiConfig;
use stridebook_daybook::edit::{MaterializeRequest, UpdateRequest};
use stridebook_daybook::SourceKind;

use crate::error::FetchError;
use crate::http::{HttpClient, RetryPolicy};
use crate::source::{DateWindow, DayBookSource, LedgerWriter};

pub struct DayBookApi {
    http: HttpClient,
    booking_base: String,
    ledger_base: String,
}

impl DayBookApi {
    /// Build from config; the bearer token is read from `api.api_key_env`.
    pub fn from_config(api: &ApiConfig) -> Result<Self, FetchError> {
        let token = api
            .api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok());
        let http = HttpClient::new(Duration::from_secs(api.timeout_secs), token)?;
        Ok(Self::new(http, &api.booking_base_url, &api.ledger_base_url))
    }

    pub fn new(http: HttpClient, booking_base: &str, ledger_base: &str) -> Self {
        Self {
            http,
            booking_base: booking_base.trim_end_matches('/').to_string(),
            ledger_base: ledger_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.http = self.http.with_retry(retry);
        self
    }

    fn ledger_url(&self, path: &str) -> String {
        format!("{}/{}", self.ledger_base, path)
    }

    /// `transactions/<id>` with the id escaped as a single path segment.
    fn record_url(&self, id: &str) -> Result<Url, FetchError> {
        let invalid = |message: String| FetchError::ClientBuild(format!("ledger url: {message}"));
        let mut url = Url::parse(&self.ledger_url("transactions")).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("base cannot carry a path".into()))?
            .push(id);
        Ok(url)
    }
}

/// Booking-API list endpoint per feed.
pub fn booking_endpoint(kind: SourceKind) -> Option<&'static str> {
    match kind {
        SourceKind::Booking => Some("GetBookingList"),
        SourceKind::RentOut => Some("GetRentoutList"),
        SourceKind::Return => Some("GetReturnList"),
        SourceKind::Cancel => Some("GetDeleteList"),
        SourceKind::Ledger | SourceKind::Overrides | SourceKind::Opening => None,
    }
}

/// Rows at `pointer`. Missing or null reads as no rows.
fn rows_at(endpoint: &str, body: &Value, pointer: &str) -> Result<Vec<Value>, FetchError> {
    match body.pointer(pointer) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(rows)) => Ok(rows.clone()),
        Some(other) => Err(FetchError::Decode {
            endpoint: endpoint.to_string(),
            message: format!("expected an array at {pointer}, got {other}"),
        }),
    }
}

impl DayBookSource for DayBookApi {
    fn fetch_rows(&self, kind: SourceKind, window: &DateWindow) -> Result<Vec<Value>, FetchError> {
        if kind == SourceKind::Ledger {
            let url = self.ledger_url("transactions");
            let body = self.http.send_json("ledger", |http| {
                http.get(&url).query(&[
                    ("locationCode", window.location_code.clone()),
                    ("dateFrom", window.date_from.to_string()),
                    ("dateTo", window.date_to.to_string()),
                ])
            })?;
            return rows_at("ledger", &body, "/data");
        }

        let Some(endpoint) = booking_endpoint(kind) else {
            return Ok(Vec::new());
        };
        let url = format!("{}/{}", self.booking_base, endpoint);
        let body = self
            .http
            .send_json(endpoint, |http| http.post(&url).json(window))?;
        rows_at(endpoint, &body, "/dataSet/data")
    }

    fn fetch_overrides(&self, window: &DateWindow) -> Result<Vec<Value>, FetchError> {
        let url = self.ledger_url("overrides");
        let body = self.http.send_json("overrides", |http| {
            http.get(&url).query(&[
                ("dateFrom", window.date_from.to_string()),
                ("dateTo", window.date_to.to_string()),
                ("locationCode", window.location_code.clone()),
            ])
        })?;
        rows_at("overrides", &body, "/data")
    }

    fn fetch_opening(&self, location_code: &str, date: NaiveDate) -> Result<Option<Value>, FetchError> {
        let url = self.ledger_url("closing-balance");
        let result = self.http.send_json("opening", |http| {
            http.get(&url)
                .query(&[("locationCode", location_code.to_string()), ("date", date.to_string())])
        });
        match result {
            Ok(body) => Ok(body.get("data").filter(|d| !d.is_null()).cloned()),
            Err(FetchError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl LedgerWriter for DayBookApi {
    fn create(&self, request: &MaterializeRequest) -> Result<Option<String>, FetchError> {
        let url = self.ledger_url("transactions");
        let body = self
            .http
            .send_json_once("ledger create", |http| http.post(&url).json(request))?;
        Ok(["/data/_id", "/_id", "/data/id", "/id"]
            .iter()
            .find_map(|p| body.pointer(p))
            .map(stridebook_daybook::coerce::value_to_string)
            .filter(|id| !id.trim().is_empty()))
    }

    fn update(&self, id: &str, request: &UpdateRequest) -> Result<(), FetchError> {
        let url = self.record_url(id)?;
        self.http
            .send_json("ledger update", |http| http.put(url.clone()).json(request))?;
        Ok(())
    }
}
