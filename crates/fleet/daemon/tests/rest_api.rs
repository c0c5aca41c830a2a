//! REST router tests driven through `tower::ServiceExt::oneshot`

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{new_log, serials, sn, BrokenLedger, RecordingGateway};
use fleet_daemon::api::create_router;
use fleet_daemon::api::rest::AppState;
use fleet_daemon::{Reconciler, Scheduler};
use fleet_gateway::Credentials;
use fleet_ledger::{DeviceLedger, InMemoryLedger};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tower::ServiceExt;

struct Harness {
    router: Router,
    ledger: Arc<dyn DeviceLedger>,
    shutdown_rx: watch::Receiver<bool>,
    // Held so manual triggers can queue
    _trigger_rx: mpsc::Receiver<()>,
}

fn harness_with(ledger: Arc<dyn DeviceLedger>) -> Harness {
    let gateway = Arc::new(RecordingGateway::new(new_log(), &[]));
    let reconciler = Reconciler::new(ledger.clone(), gateway, Credentials::default());
    let (scheduler, trigger_rx) = Scheduler::new(Duration::from_secs(900), reconciler);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = AppState::new(ledger.clone(), scheduler, shutdown_tx);

    Harness {
        router: create_router(state),
        ledger,
        shutdown_rx,
        _trigger_rx: trigger_rx,
    }
}

async fn harness() -> Harness {
    let ledger: Arc<dyn DeviceLedger> = Arc::new(InMemoryLedger::new());
    ledger.seed(&serials(&["SN-001", "SN-002", "SN-003"])).await.unwrap();
    ledger.mark_modified(&sn("SN-002")).await.unwrap();
    harness_with(ledger)
}

async fn send(router: &Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn send_json(router: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(router, method, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_list_devices_returns_every_record() {
    let h = harness().await;

    let (status, body) = send_json(&h.router, "GET", "/api/devices").await;

    assert_eq!(status, StatusCode::OK);
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 3);

    let modified = records
        .iter()
        .find(|r| r["serial"] == "SN-002")
        .unwrap();
    assert_eq!(modified["state"], "modified");
    assert!(modified["modifiedAt"].is_string());
    assert!(modified["createdAt"].is_string());

    let pending = records
        .iter()
        .find(|r| r["serial"] == "SN-001")
        .unwrap();
    assert_eq!(pending["state"], "unmodified");
    assert!(pending["modifiedAt"].is_null());
}

#[tokio::test]
async fn test_list_devices_surfaces_ledger_failure() {
    let h = harness_with(Arc::new(BrokenLedger));

    let (status, body) = send_json(&h.router, "GET", "/api/devices").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "LEDGER_ERROR");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_health_check() {
    let h = harness().await;

    let (status, body) = send_json(&h.router, "GET", "/api/v1/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_reports_device_counts() {
    let h = harness().await;

    let (status, body) = send_json(&h.router, "GET", "/api/v1/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["devices"]["total"], 3);
    assert_eq!(body["devices"]["unmodified"], 2);
    assert_eq!(body["devices"]["modified"], 1);
    assert!(body["last_pass"].is_null());
    assert_eq!(body["pass_in_flight"], false);
}

#[tokio::test]
async fn test_manual_trigger_queues_once() {
    let h = harness().await;

    let (status, body) = send_json(&h.router, "POST", "/api/v1/reconcile").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "queued");

    let (status, body) = send_json(&h.router, "POST", "/api/v1/reconcile").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "already_queued");

    assert_eq!(h.ledger.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_shutdown_endpoint_signals() {
    let h = harness().await;

    let (status, body) = send_json(&h.router, "POST", "/api/v1/system/shutdown").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");
    assert!(*h.shutdown_rx.borrow());
}

#[tokio::test]
async fn test_status_page_is_served() {
    let h = harness().await;

    let (status, body) = send(&h.router, "GET", "/").await;

    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("/api/devices"));
    assert!(html.contains("Pending"));
    assert!(html.contains("Modified"));
}
