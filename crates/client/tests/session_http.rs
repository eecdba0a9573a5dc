use std::time::Duration;

use chrono::NaiveDate;
use httpmock::prelude::*;
use serde_json::json;

use stridebook_client::{DateWindow, DayBookApi, DayBookSession, HttpClient, RetryPolicy};
use stridebook_daybook::{
    DayBookConfig, DayBookParams, DedupKey, EditPatch, Settlement, SourceKind,
};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn session(server: &MockServer, timeout: Duration) -> DayBookSession<DayBookApi> {
    let http = HttpClient::new(timeout, None)
        .unwrap()
        .with_retry(RetryPolicy::none());
    let api = DayBookApi::new(http, &server.url("/rentals"), &server.url("/ledger"));
    DayBookSession::new(api, DayBookConfig::default())
}

fn mock_empty_booking_feeds(server: &MockServer, except: &str) {
    for endpoint in ["GetBookingList", "GetRentoutList", "GetReturnList", "GetDeleteList"] {
        if endpoint == except {
            continue;
        }
        server.mock(|when, then| {
            when.method(POST).path(format!("/rentals/{endpoint}"));
            then.status(200).json_body(json!({"dataSet": {"data": []}}));
        });
    }
}

#[test]
fn reconcile_over_http() {
    let server = MockServer::start();
    mock_empty_booking_feeds(&server, "GetBookingList");
    server.mock(|when, then| {
        when.method(POST).path("/rentals/GetBookingList");
        then.status(200).json_body(json!({"dataSet": {"data": [
            {"invoiceNo": "B-100", "bookingDate": "2025-03-01", "bookingCashAmount": 5000}
        ]}}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/ledger/transactions");
        then.status(200).json_body(json!({"data": [
            {"_id": "66a1", "invoiceNo": "B-100", "date": "2025-03-01", "type": "Booking", "cash": 5200}
        ]}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/ledger/overrides");
        then.status(200).json_body(json!({"data": []}));
    });
    let opening = server.mock(|when, then| {
        when.method(GET)
            .path("/ledger/closing-balance")
            .query_param("date", "2025-02-28");
        then.status(200).json_body(json!({"data": {"closingCash": 1000}}));
    });

    let session = session(&server, Duration::from_secs(5));
    let window = DateWindow::new("L01", d("2025-03-01"), d("2025-03-01"));
    let book = session
        .reconcile(&window, &DayBookParams::default())
        .unwrap()
        .current()
        .unwrap();

    opening.assert();
    assert!(!book.is_degraded());
    assert_eq!(book.transactions.len(), 1);
    assert_eq!(book.transactions[0].ledger_id.as_deref(), Some("66a1"));
    assert_eq!(book.totals.cash, 100000 + 520000);
}

#[test]
fn failing_and_slow_sources_degrade() {
    let server = MockServer::start();
    mock_empty_booking_feeds(&server, "GetReturnList");
    server.mock(|when, then| {
        when.method(POST).path("/rentals/GetReturnList");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(json!({"dataSet": {"data": []}}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/ledger/transactions");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/ledger/overrides");
        then.status(200).json_body(json!({"data": []}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/ledger/closing-balance");
        then.status(404);
    });

    let session = session(&server, Duration::from_millis(500));
    let window = DateWindow::new("L01", d("2025-03-01"), d("2025-03-01"));
    let book = session
        .reconcile(&window, &DayBookParams::default())
        .unwrap()
        .current()
        .unwrap();

    let failed: Vec<SourceKind> = book.degraded.iter().map(|f| f.source).collect();
    assert_eq!(failed, vec![SourceKind::Return, SourceKind::Ledger]);
    assert_eq!(book.opening.closing_cash, 0);
    assert_eq!(book.totals.cash, 0);
}

#[test]
fn edit_materializes_then_updates_over_http() {
    let server = MockServer::start();
    mock_empty_booking_feeds(&server, "GetBookingList");
    server.mock(|when, then| {
        when.method(POST).path("/rentals/GetBookingList");
        then.status(200).json_body(json!({"dataSet": {"data": [
            {"invoiceNo": "B-100", "bookingDate": "2025-03-01", "bookingCashAmount": 5000}
        ]}}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/ledger/transactions");
        then.status(200).json_body(json!({"data": []}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/ledger/overrides");
        then.status(200).json_body(json!({"data": []}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/ledger/closing-balance");
        then.status(404);
    });
    let create = server.mock(|when, then| {
        when.method(POST).path("/ledger/transactions");
        then.status(201).json_body(json!({"data": {"_id": "66aa"}}));
    });
    let update = server.mock(|when, then| {
        when.method(PUT).path("/ledger/transactions/66aa");
        then.status(200).json_body(json!({"ok": true}));
    });

    let session = session(&server, Duration::from_secs(5));
    let params = DayBookParams::default();
    let window = DateWindow::new("L01", d("2025-03-01"), d("2025-03-01"));
    let mut book = session.reconcile(&window, &params).unwrap().current().unwrap();

    let key = DedupKey {
        invoice_key: "B-100".into(),
        date: d("2025-03-01"),
        category: "booking".into(),
    };
    let patch = EditPatch {
        settlement: Settlement { cash: 200000, upi: 300000, ..Settlement::default() },
        ..EditPatch::default()
    };
    let outcome = session
        .edit(session.source(), &mut book, &key, &patch, &params)
        .unwrap();

    create.assert();
    update.assert();
    assert!(outcome.materialized);
    assert_eq!(outcome.ledger_id, "66aa");
    assert_eq!(book.totals.cash, 200000);
    assert_eq!(book.totals.upi, 300000);
    assert_eq!(book.transactions[0].ledger_id.as_deref(), Some("66aa"));
}
