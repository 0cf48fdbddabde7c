//! Contract Test: HTTP surface
//!
//! Constraints verified:
//! - Request/confirm round trip answers `{"ok":true}` and moves the record
//! - Unknown and repeated confirmations are 404 with the fixed message
//! - Missing fields are 400 plain text
//! - Views render ascending and per client
//! - Requests without any address are rejected

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use slotlog_core::{
    ClientKey, FileRecordStore, LedgerConfig, MemoryRecordStore, RecordStore, SlotLedger,
    TimeDisplay,
};
use slotlog_http::{AppState, build_router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

const ALICE: &str = "10.0.0.1";
const BOB: &str = "10.0.0.2";

fn app_with(store: Arc<dyn RecordStore>) -> (Router, Arc<AppState>) {
    let (ledger, _rx) = SlotLedger::new(store, &LedgerConfig::default()).unwrap();
    let state = Arc::new(AppState::new(ledger, TimeDisplay::default()));
    (build_router(Arc::clone(&state)), state)
}

fn app() -> (Router, Arc<AppState>) {
    app_with(Arc::new(MemoryRecordStore::new()))
}

fn post(uri: &str, from: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", from)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, from: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", from)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn request_slot(app: &Router, from: &str, data: &str, time: &str) -> (StatusCode, String) {
    let body = json!({"data": data, "time": time});
    send(app, post("/api/slot-request", from, body)).await
}

async fn confirm_slot(app: &Router, from: &str, data: &str) -> (StatusCode, String) {
    send(app, post("/api/slot-confirm", from, json!({"data": data}))).await
}

fn as_json(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = app();
    let (status, body) = send(&app, get("/health", ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({"status": "ok"}));
}

#[tokio::test]
async fn request_then_confirm_round_trip() {
    let (app, state) = app();
    let alice = ClientKey::sanitize(ALICE);

    let (status, body) = request_slot(&app, ALICE, "slot-42", "2024-01-01 10:00:02").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({"ok": true}));

    let (status, body) = confirm_slot(&app, ALICE, "slot-42").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({"ok": true}));

    assert!(state.ledger.pending(&alice).await.unwrap().is_empty());
    let confirmed = state.ledger.confirmed(&alice).await.unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].token, "slot-42");
}

#[tokio::test]
async fn confirming_twice_is_200_then_404() {
    let (app, _) = app();
    request_slot(&app, ALICE, "once", "2024-01-01 10:00:00").await;

    let (first, _) = confirm_slot(&app, ALICE, "once").await;
    let (second, body) = confirm_slot(&app, ALICE, "once").await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::NOT_FOUND);
    assert_eq!(body, "Pending slot request not found");
}

#[tokio::test]
async fn unknown_confirmation_leaves_buckets_unchanged() {
    let (app, state) = app();
    let alice = ClientKey::sanitize(ALICE);
    request_slot(&app, ALICE, "real", "2024-01-01 10:00:00").await;

    let (status, _) = confirm_slot(&app, ALICE, "fake").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(state.ledger.pending(&alice).await.unwrap().len(), 1);
    assert!(state.ledger.confirmed(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_fields_are_bad_requests() {
    let (app, _) = app();

    let (status, body) = send(&app, post("/api/slot-request", ALICE, json!({"data": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing data/time");

    let (status, body) = request_slot(&app, ALICE, "", "t").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing data/time");

    let (status, body) = send(&app, post("/api/slot-confirm", ALICE, json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing data");
}

#[tokio::test]
async fn non_json_body_is_a_bad_request() {
    let (app, _) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/slot-request")
        .header("x-forwarded-for", ALICE)
        .body(Body::from("data=x&time=y"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing data/time");
}

#[tokio::test]
async fn confirmed_page_is_sorted_and_per_client() {
    let (app, _) = app();
    for (token, time) in [
        ("slot-second", "2024-01-01 10:00:09"),
        ("slot-first", "2024-01-01 10:00:01"),
    ] {
        request_slot(&app, ALICE, token, time).await;
        confirm_slot(&app, ALICE, token).await;
    }

    let (status, page) = send(&app, get("/", ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    let first = page.find("slot-first").unwrap();
    let second = page.find("slot-second").unwrap();
    assert!(first < second, "ascending by timestamp");

    let (_, other) = send(&app, get("/", BOB)).await;
    assert!(!other.contains("slot-first"));
    assert!(!other.contains("slot-second"));
}

#[tokio::test]
async fn visits_page_applies_the_display_offset() {
    let (app, _) = app();
    request_slot(&app, ALICE, "a", "2024-01-01 10:00:02.500").await;

    let (status, page) = send(&app, get("/visits", ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("2024-01-01 10:00:00"));
    assert!(!page.contains("10:00:02"));
}

#[tokio::test]
async fn visits_page_lists_rows_in_ascending_time() {
    let (app, _) = app();
    for (token, time) in [
        ("c", "2024-01-01 10:00:32"),
        ("a", "2024-01-01 10:00:12"),
        ("b", "2024-01-01 10:00:22.750"),
    ] {
        request_slot(&app, ALICE, token, time).await;
    }

    let (status, page) = send(&app, get("/visits", ALICE)).await;
    assert_eq!(status, StatusCode::OK);

    let badges: Vec<&str> = page
        .split("<span class=\"time-badge\">")
        .skip(1)
        .filter_map(|rest| rest.split_once("</span>").map(|(time, _)| time))
        .collect();
    assert_eq!(
        badges,
        vec![
            "2024-01-01 10:00:10",
            "2024-01-01 10:00:20",
            "2024-01-01 10:00:30",
        ]
    );
}

#[tokio::test]
async fn stored_markup_is_escaped() {
    let (app, _) = app();
    let token = "<script>x</script>";
    request_slot(&app, ALICE, token, "2024-01-01 10:00:00").await;
    confirm_slot(&app, ALICE, token).await;

    let (_, page) = send(&app, get("/", ALICE)).await;
    assert!(!page.contains(token));
    assert!(page.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn global_log_endpoints_stay_out_of_client_buckets() {
    let (app, state) = app();

    let logged = json!({"data": "tok", "time": "2024-01-01 10:00:00"});
    let (status, _) = send(&app, post("/log", ALICE, logged)).await;
    assert_eq!(status, StatusCode::OK);

    let visited = json!({"page": "/apply", "time": "2024-01-01 10:00:01"});
    let (status, _) = send(&app, post("/visit", ALICE, visited)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, post("/visit", ALICE, json!({"page": "/apply"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing time");

    assert_eq!(state.ledger.request_log().await.unwrap().len(), 1);
    assert_eq!(state.ledger.global_visits().await.unwrap().len(), 1);
    let alice = ClientKey::sanitize(ALICE);
    assert!(state.ledger.visits(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn peer_address_is_used_without_proxy_header() {
    let (app, state) = app();
    let peer: SocketAddr = "192.168.1.7:55000".parse().unwrap();
    let body = json!({"data": "p", "time": "2024-01-01 10:00:00"});
    let mut request = Request::builder()
        .method(Method::POST)
        .uri("/api/slot-request")
        .body(Body::from(body.to_string()))
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let peer_key = ClientKey::sanitize("192.168.1.7");
    assert_eq!(state.ledger.pending(&peer_key).await.unwrap().len(), 1);
}

#[tokio::test]
async fn request_without_any_address_is_rejected() {
    let (app, _) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/slot-request")
        .body(Body::from(json!({"data": "p", "time": "t"}).to_string()))
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn file_store_writes_sanitized_file_names() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileRecordStore::new(dir.path()).await.unwrap();
    let (app, _) = app_with(Arc::new(store));

    let (status, _) = request_slot(&app, "::1, 10.9.9.9", "v6", "2024-01-01 10:00:00").await;
    assert_eq!(status, StatusCode::OK);
    assert!(dir.path().join("pendingSlotRequests____1.json").exists());
}

#[tokio::test]
async fn unreadable_bucket_is_a_500_without_internal_detail() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileRecordStore::new(dir.path()).await.unwrap();
    let (app, _) = app_with(Arc::new(store));

    let file = dir.path().join("confirmedSlotRequests__10.0.0.1.json");
    std::fs::write(&file, "{garbage").unwrap();

    let (status, body) = send(&app, get("/", ALICE)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal server error");
    assert!(!body.contains("confirmedSlotRequests"));
}
