//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::Value;

use stridebook_daybook::edit::{MaterializeRequest, UpdateRequest};
use stridebook_daybook::SourceKind;

use crate::error::FetchError;
use crate::source::{DateWindow, DayBookSource, LedgerWriter};

#[derive(Default)]
pub struct FakeSource {
    rows: HashMap<SourceKind, Vec<Value>>,
    overrides: Vec<Value>,
    opening: Option<Value>,
    failing: HashSet<SourceKind>,
    panicking: HashSet<SourceKind>,
    /// Booking-feed latency per location code.
    delays: HashMap<String, Duration>,
    opening_requests: Mutex<Vec<NaiveDate>>,
}

impl FakeSource {
    pub fn with_rows(mut self, kind: SourceKind, rows: Vec<Value>) -> Self {
        self.rows.insert(kind, rows);
        self
    }

    pub fn with_overrides(mut self, rows: Vec<Value>) -> Self {
        self.overrides = rows;
        self
    }

    pub fn with_opening(mut self, data: Value) -> Self {
        self.opening = Some(data);
        self
    }

    pub fn failing(mut self, kind: SourceKind) -> Self {
        self.failing.insert(kind);
        self
    }

    pub fn panicking(mut self, kind: SourceKind) -> Self {
        self.panicking.insert(kind);
        self
    }

    pub fn with_delay(mut self, location_code: &str, delay: Duration) -> Self {
        self.delays.insert(location_code.to_string(), delay);
        self
    }

    pub fn opening_requests(&self) -> Vec<NaiveDate> {
        self.opening_requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn check(&self, kind: SourceKind) -> Result<(), FetchError> {
        if self.panicking.contains(&kind) {
            panic!("{kind} exploded");
        }
        if self.failing.contains(&kind) {
            return Err(FetchError::Transport {
                endpoint: kind.to_string(),
                attempts: 1,
                message: "connection refused".into(),
            });
        }
        Ok(())
    }
}

impl DayBookSource for FakeSource {
    fn fetch_rows(&self, kind: SourceKind, window: &DateWindow) -> Result<Vec<Value>, FetchError> {
        if kind == SourceKind::Booking {
            if let Some(delay) = self.delays.get(&window.location_code) {
                thread::sleep(*delay);
            }
        }
        self.check(kind)?;
        Ok(self.rows.get(&kind).cloned().unwrap_or_default())
    }

    fn fetch_overrides(&self, _window: &DateWindow) -> Result<Vec<Value>, FetchError> {
        self.check(SourceKind::Overrides)?;
        Ok(self.overrides.clone())
    }

    fn fetch_opening(&self, _location_code: &str, date: NaiveDate) -> Result<Option<Value>, FetchError> {
        if let Ok(mut requests) = self.opening_requests.lock() {
            requests.push(date);
        }
        self.check(SourceKind::Opening)?;
        Ok(self.opening.clone())
    }
}

#[derive(Default)]
pub struct FakeWriter {
    pub id: Option<String>,
    pub fail_create: bool,
    pub fail_update: bool,
    pub creates: Mutex<Vec<MaterializeRequest>>,
    pub updates: Mutex<Vec<(String, UpdateRequest)>>,
    /// Sleep applied to every update call.
    pub delay: Duration,
}

impl FakeWriter {
    pub fn returning(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::default()
        }
    }

    pub fn create_count(&self) -> usize {
        self.creates.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn update_ids(&self) -> Vec<String> {
        self.updates
            .lock()
            .map(|u| u.iter().map(|(id, _)| id.clone()).collect())
            .unwrap_or_default()
    }
}

fn rejected(endpoint: &str) -> FetchError {
    FetchError::Rejected {
        endpoint: endpoint.to_string(),
        status: 422,
        message: "locked day".into(),
    }
}

impl LedgerWriter for FakeWriter {
    fn create(&self, request: &MaterializeRequest) -> Result<Option<String>, FetchError> {
        if self.fail_create {
            return Err(rejected("ledger create"));
        }
        if let Ok(mut creates) = self.creates.lock() {
            creates.push(request.clone());
        }
        Ok(self.id.clone())
    }

    fn update(&self, id: &str, request: &UpdateRequest) -> Result<(), FetchError> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if self.fail_update {
            return Err(rejected("ledger update"));
        }
        if let Ok(mut updates) = self.updates.lock() {
            updates.push((id.to_string(), request.clone()));
        }
        Ok(())
    }
}
