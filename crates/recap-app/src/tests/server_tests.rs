use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::Local;
use recap_core::ReportStore;
use recap_types::AnalysisRecord;
use serde_json::Value;
use tower::ServiceExt;

use super::*;
use crate::server::{ServerState, router};

async fn get(store: Arc<ReportStore>, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router(ServerState { store })
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_report_without_data_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ReportStore::new(dir.path()));

    let (status, body) = get(store, "/report").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body), serde_json::json!({ "error": "No reports available" }));
}

#[tokio::test]
async fn test_report_returns_todays_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ReportStore::new(dir.path()));
    let now = Local::now().naive_local();
    store.append(AnalysisRecord::new("first screen", now)).await.unwrap();
    store.append(AnalysisRecord::new("second screen", now)).await.unwrap();

    let (status, body) = get(store, "/report").await;
    assert_eq!(status, StatusCode::OK);

    let body = json(&body);
    assert_eq!(body["date"], now.date().format("%Y-%m-%d").to_string());
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["text"], "first screen");
    assert!(records[0].get("elapsedSinceFirst").is_none());
    assert_eq!(records[1]["elapsedSinceFirst"], "00:00:00");
}

#[tokio::test]
async fn test_report_for_other_date() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ReportStore::new(dir.path()));
    store
        .append(AnalysisRecord::new("old work", at("2026-03-01 09:00:00")))
        .await
        .unwrap();

    let (status, body) = get(store.clone(), "/report/2026-03-01").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["records"][0]["timestamp"], "2026-03-01 09:00:00");

    let (status, _) = get(store.clone(), "/report/2026-03-02").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(store, "/report/yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().contains("yesterday"));
}

#[tokio::test]
async fn test_reports_lists_dates() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ReportStore::new(dir.path()));
    store
        .append(AnalysisRecord::new("b", at("2026-03-02 09:00:00")))
        .await
        .unwrap();
    store
        .append(AnalysisRecord::new("a", at("2026-03-01 09:00:00")))
        .await
        .unwrap();

    let (status, body) = get(store, "/reports").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!({ "dates": ["2026-03-01", "2026-03-02"] }));
}

#[tokio::test]
async fn test_readable_report_is_plain_text() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ReportStore::new(dir.path()));
    let date = at("2026-03-01 09:00:00").date();
    store.write_readable(date, "On 2026-03-01 09:00:00,\n").await.unwrap();

    let (status, body) = get(store.clone(), "/report/2026-03-01/readable").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), "On 2026-03-01 09:00:00,\n");

    let (status, _) = get(store, "/report/2026-03-02/readable").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_partition_is_500() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ReportStore::new(dir.path()));
    let today = Local::now().date_naive();
    std::fs::write(store.partition_path(today), "{ not json").unwrap();

    let (status, body) = get(store, "/report").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body), serde_json::json!({ "error": "Report store unavailable" }));
    assert!(!String::from_utf8(body).unwrap().contains("combined_report"));
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ReportStore::new(dir.path()));

    let (status, body) = get(store, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}
