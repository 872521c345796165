//! REST API integration tests
//!
//! Starts the dashboard on an ephemeral port and exercises health, plot
//! and log endpoints with `reqwest`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use wanlog_dashboard::app_state::AppState;
use wanlog_dashboard::build_app;
use wanlog_dashboard::config::EngineSettings;
use wanlog_dashboard::domain::{Plot, PlotBus, PlotRegistry};
use wanlog_dashboard::logs::ScanDatabase;
use wanlog_dashboard::service::PlotService;

const LOG: &str = "\
2019-04-19 03:35:51 192.168.0.1 S= INFO WAN:686be2ac -- connecting -> connected, Reason: Failback
2019-04-19 03:36:51 192.168.0.1 S= INFO WAN:686be2ac -- signal MC400LPE (SIM1) on port modem2: 100%, RSSI:-45(dBm), SINR:15.6(dB), RFBAND: Band 13
2019-04-19 03:37:00 192.168.0.1 S= ERROR WAN:686be2ac -- Modem mdm0 not responding
2019-04-19 03:38:00 192.168.0.1 S= INFO IPSEC -- IKE SA tunnel1 failed
";

const DATABASE: &str = r#"{
  "Connectivity+Modem": [{"Message": "Modem .* not responding", "Meaning": "Modem firmware hang"}],
  "IPSec": [{"Message": "IKE SA .* failed", "Meaning": "Peer unreachable or PSK mismatch"}]
}"#;

// ============================================================================
// Test Fixtures
// ============================================================================

async fn start_server(log_dir: &Path, database: Option<ScanDatabase>) -> SocketAddr {
    let mut service = PlotService::new(Arc::new(PlotRegistry::new()), PlotBus::new(64))
        .with_log_dir(log_dir);
    if let Some(database) = database {
        service = service.with_database(database);
    }
    service.publish(Plot::demo()).await.unwrap();

    let app = build_app(AppState::new(service, EngineSettings::default()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// ============================================================================
// System
// ============================================================================

#[tokio::test]
async fn test_health_reports_plots_and_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path(), None).await;

    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["plots"], 1);
    assert_eq!(body["sessions"]["active"], 0);
    assert_eq!(body["sessions"]["total"], 0);
}

// ============================================================================
// Logs and plots
// ============================================================================

#[tokio::test]
async fn test_ingest_list_get_delete() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path(), None).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/api/v1/logs"))
        .json(&json!({ "name": "router", "contents": LOG }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "router.log");
    let titles: Vec<&str> = body["plots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(
        titles,
        vec![
            "Connection State Graph",
            "RSSI Signal Quality",
            "SINR Signal Quality"
        ]
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("router.log")).unwrap(),
        LOG
    );

    let list: Value = client
        .get(format!("http://{addr}/api/v1/plots?source=router.log"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["pagination"]["total"], 3);

    let all: Value = client
        .get(format!("http://{addr}/api/v1/plots?per_page=2&page=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all["pagination"]["total"], 4);
    assert_eq!(all["pagination"]["total_pages"], 2);
    assert_eq!(all["data"].as_array().unwrap().len(), 2);

    let id = body["plots"][0]["id"].as_str().unwrap().to_string();
    let plot: Value = client
        .get(format!("http://{addr}/api/v1/plots/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(plot["kind"], "step");
    assert_eq!(plot["y_range"][7], "connected");

    let deleted = client
        .delete(format!("http://{addr}/api/v1/plots/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = client
        .get(format!("http://{addr}/api/v1/plots/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let error: Value = missing.json().await.unwrap();
    assert_eq!(error["error"]["code"], 2001);
}

#[tokio::test]
async fn test_ingest_rejects_empty_log() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path(), None).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/logs"))
        .json(&json!({ "name": "empty.log", "contents": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["error"]["code"], 1001);
}

// ============================================================================
// Scan
// ============================================================================

#[tokio::test]
async fn test_scan_without_database_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path(), None).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/logs/scan"))
        .json(&json!({ "contents": LOG }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_scan_reports_known_problems() {
    let dir = tempfile::tempdir().unwrap();
    let database = ScanDatabase::from_json(DATABASE).unwrap();
    let addr = start_server(dir.path(), Some(database)).await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/api/v1/logs/scan");

    let body: Value = client
        .post(&url)
        .json(&json!({ "contents": LOG }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 2);
    assert_eq!(body["problems"][0]["line"], 3);
    assert_eq!(body["problems"][0]["category"], "Connectivity+Modem");
    assert_eq!(body["problems"][1]["category"], "IPSec");
    assert!(
        body["report"]
            .as_str()
            .unwrap()
            .starts_with("Problem found on line 3: Modem .* not responding\nCommon meaning of error: Modem firmware hang")
    );

    let only_ipsec: Value = client
        .post(&url)
        .json(&json!({ "contents": LOG, "categories": ["IPSec"] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(only_ipsec["count"], 1);

    let bogus = client
        .post(&url)
        .json(&json!({ "contents": LOG, "categories": ["Wireless"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(bogus.status(), StatusCode::BAD_REQUEST);
}
