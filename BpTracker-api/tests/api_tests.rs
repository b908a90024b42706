use std::sync::{Arc, Once};

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderValue, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use bp_tracker_api::api::{create_app, AppState};
use bp_tracker_domain::clients::{AnalysisClient, ExtractionClient};
use bp_tracker_domain::config::AiConfig;
use bp_tracker_domain::testing::{
    candidate, memory_store, GatedAnalysisClient, StaticAnalysisClient, StaticExtractionClient,
};

// Ensure tracing is initialized only once
static INIT: Once = Once::new();

fn initialize() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

fn configured_ai() -> AiConfig {
    AiConfig {
        api_key: Some("test-key".to_string()),
        ..AiConfig::default()
    }
}

fn app_with(analysis: Arc<dyn AnalysisClient>, extraction: Arc<dyn ExtractionClient>) -> Router {
    initialize();
    let (store, _storage) = memory_store().expect("in-memory store opens");
    let state = AppState::new(Arc::new(store), analysis, extraction, configured_ai());
    create_app(state, &[])
}

fn test_app() -> Router {
    app_with(
        Arc::new(StaticAnalysisClient::replying("血压总体平稳")),
        Arc::new(StaticExtractionClient::returning(Vec::new())),
    )
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn measurement(systolic: u16, diastolic: u16, minutes_ago: i64) -> Value {
    json!({
        "timestamp": (Utc::now() - Duration::minutes(minutes_ago)).to_rfc3339(),
        "systolic": systolic,
        "diastolic": diastolic,
        "heartRate": 72,
        "arm": "left",
        "note": "morning"
    })
}

#[tokio::test]
async fn test_health_reports_ok_with_key() {
    let app = test_app();

    let (status, body) = send_json(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["components"]["storage"]["status"], "ok");
    assert_eq!(body["components"]["ai"]["status"], "ok");
}

#[tokio::test]
async fn test_health_degraded_without_key_still_ok() {
    initialize();
    let (store, _storage) = memory_store().unwrap();
    let state = AppState::new(
        Arc::new(store),
        Arc::new(StaticAnalysisClient::replying("x")),
        Arc::new(StaticExtractionClient::returning(Vec::new())),
        AiConfig::default(),
    );
    let app = create_app(state, &[]);

    let (status, body) = send_json(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["components"]["ai"]["status"], "degraded");
}

#[tokio::test]
async fn test_health_unreadable_storage_is_error() {
    initialize();
    let (store, storage) = memory_store().unwrap();
    let state = AppState::new(
        Arc::new(store),
        Arc::new(StaticAnalysisClient::replying("x")),
        Arc::new(StaticExtractionClient::returning(Vec::new())),
        configured_ai(),
    );
    let app = create_app(state, &[]);
    storage.set_fail_reads(true);

    let (status, body) = send_json(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert_eq!(body["components"]["storage"]["status"], "error");
}

#[tokio::test]
async fn test_create_and_list_records_newest_first() {
    let app = test_app();

    let (status, created) = send_json(&app, Method::POST, "/api/v1/records", Some(measurement(118, 76, 60))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["severity"], "normal");
    assert_eq!(created["severityLabel"], "正常");

    let (status, _) = send_json(&app, Method::POST, "/api/v1/records", Some(measurement(150, 85, 5))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, list) = send_json(&app, Method::GET, "/api/v1/records", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["systolic"], 150);
    assert_eq!(list[0]["severity"], "stage2");
    assert_eq!(list[1]["id"], created["id"]);

    let uri = format!("/api/v1/records/{}", created["id"].as_str().unwrap());
    let (status, fetched) = send_json(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["note"], "morning");
}

#[tokio::test]
async fn test_create_rejects_out_of_range_values() {
    let app = test_app();

    let (status, body) = send_json(&app, Method::POST, "/api/v1/records", Some(measurement(20, 76, 0))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (_, list) = send_json(&app, Method::GET, "/api/v1/records", None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_replaces_record() {
    let app = test_app();
    let (_, created) = send_json(&app, Method::POST, "/api/v1/records", Some(measurement(118, 76, 10))).await;
    let uri = format!("/api/v1/records/{}", created["id"].as_str().unwrap());

    let (status, updated) = send_json(&app, Method::PUT, &uri, Some(measurement(185, 100, 10))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["severity"], "crisis");

    let (status, _) = send_json(&app, Method::PUT, "/api/v1/records/missing", Some(measurement(120, 80, 0))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let app = test_app();
    let (_, created) = send_json(&app, Method::POST, "/api/v1/records", Some(measurement(118, 76, 10))).await;
    let uri = format!("/api/v1/records/{}", created["id"].as_str().unwrap());

    let (status, body) = send_json(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "confirmation_required");

    let (status, _) = send(&app, Method::DELETE, &format!("{}?confirm=true", uri), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::DELETE, &format!("{}?confirm=true", uri), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chart_states() {
    let app = test_app();

    let (status, chart) = send_json(&app, Method::GET, "/api/v1/records/chart", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chart["state"], "no_records");

    send_json(&app, Method::POST, "/api/v1/records", Some(measurement(130, 82, 60))).await;
    send_json(&app, Method::POST, "/api/v1/records", Some(measurement(118, 76, 120))).await;

    let (_, chart) = send_json(&app, Method::GET, "/api/v1/records/chart", None).await;
    assert_eq!(chart["state"], "points");
    let points = chart["points"].as_array().unwrap();
    assert_eq!(points.len(), 2);
    // oldest first
    assert_eq!(points[0]["systolic"], 118);
    assert_eq!(points[1]["severity"], "elevated");

    let (_, chart) = send_json(
        &app,
        Method::GET,
        "/api/v1/records/chart?start=2001-01-01&end=2001-01-31",
        None,
    )
    .await;
    assert_eq!(chart["state"], "empty_range");
    assert!(chart["points"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_chart_rejects_end_without_room_for_window() {
    let app = test_app();
    send_json(&app, Method::POST, "/api/v1/records", Some(measurement(130, 82, 60))).await;

    let uri = format!("/api/v1/records/chart?end={}", NaiveDate::MIN);
    let (status, body) = send_json(&app, Method::GET, &uri, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_stats_summary() {
    let app = test_app();

    let (_, empty) = send_json(&app, Method::GET, "/api/v1/records/stats", None).await;
    assert_eq!(empty["totalCount"], 0);
    assert!(empty["latest"].is_null());

    send_json(&app, Method::POST, "/api/v1/records", Some(measurement(120, 80, 30))).await;
    send_json(&app, Method::POST, "/api/v1/records", Some(measurement(131, 85, 5))).await;

    let (status, stats) = send_json(&app, Method::GET, "/api/v1/records/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalCount"], 2);
    assert_eq!(stats["avgSystolic"], 125.5);
    assert_eq!(stats["latest"]["systolic"], 131);
}

#[tokio::test]
async fn test_export_csv() {
    let app = test_app();

    let (status, _) = send(&app, Method::GET, "/api/v1/records/export", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send_json(&app, Method::POST, "/api/v1/records", Some(measurement(120, 80, 30))).await;

    let response = app
        .clone()
        .oneshot(Request::get("/api/v1/records/export").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains("%E8%A1%80%E5%8E%8B%E8%AE%B0%E5%BD%95_"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with('\u{feff}'));
    assert_eq!(text.lines().count(), 2);
    assert!(!text.ends_with('\n'));
    assert!(text.contains("左手"));
    assert!(text.contains("\"morning\""));
}

#[tokio::test]
async fn test_import_preview_then_commit() {
    let extraction = Arc::new(StaticExtractionClient::returning(vec![
        candidate("2024-03-01T08:00:00", 128.0, 82.0),
        candidate("2024-03-02 08:00", 142.0, 91.0),
    ]));
    let app = app_with(Arc::new(StaticAnalysisClient::replying("ok")), extraction.clone());

    let (status, preview) = send_json(
        &app,
        Method::POST,
        "/api/v1/import/preview",
        Some(json!({ "text": "3月1日 128/82 心率70; 3月2日 142/91" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["count"], 2);
    assert_eq!(preview["records"][0]["arm"], "right");

    // preview stores nothing
    let (_, list) = send_json(&app, Method::GET, "/api/v1/records", None).await;
    assert!(list.as_array().unwrap().is_empty());

    let (status, committed) = send_json(
        &app,
        Method::POST,
        "/api/v1/import/commit",
        Some(json!({ "records": preview["records"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(committed["count"], 2);

    let (_, list) = send_json(&app, Method::GET, "/api/v1/records", None).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["systolic"], 142);
    assert_eq!(extraction.calls(), 1);
}

#[tokio::test]
async fn test_import_in_one_step() {
    let app = app_with(
        Arc::new(StaticAnalysisClient::replying("ok")),
        Arc::new(StaticExtractionClient::returning(vec![candidate("2024-05-05T21:30:00Z", 119.0, 77.0)])),
    );

    let (status, body) = send_json(&app, Method::POST, "/api/v1/import", Some(json!({ "text": "119/77" }))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["count"], 1);
    let (_, list) = send_json(&app, Method::GET, "/api/v1/records", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_import_errors() {
    let app = app_with(
        Arc::new(StaticAnalysisClient::replying("ok")),
        Arc::new(StaticExtractionClient::failing("garbled output")),
    );

    let (status, body) = send_json(&app, Method::POST, "/api/v1/import/preview", Some(json!({ "text": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = send_json(&app, Method::POST, "/api/v1/import", Some(json!({ "text": "hello" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "parse_failed");

    let (status, _) = send_json(&app, Method::POST, "/api/v1/import/commit", Some(json!({ "records": [] }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_insight_flow_and_reports() {
    let analysis = Arc::new(StaticAnalysisClient::replying("血压总体平稳"));
    let app = app_with(analysis.clone(), Arc::new(StaticExtractionClient::returning(Vec::new())));

    let (status, body) = send_json(&app, Method::POST, "/api/v1/insights", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(analysis.calls(), 0);
    assert_eq!(body["error"], "bad_request");

    send_json(&app, Method::POST, "/api/v1/records", Some(measurement(120, 80, 10))).await;

    let (status, body) = send_json(&app, Method::POST, "/api/v1/insights", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "succeeded");
    assert_eq!(body["text"], "血压总体平稳");

    let (status, report) = send_json(&app, Method::POST, "/api/v1/insights/save", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(report["recordCount"], 1);

    let (_, reports) = send_json(&app, Method::GET, "/api/v1/reports", None).await;
    assert_eq!(reports.as_array().unwrap().len(), 1);

    let (status, body) = send_json(&app, Method::DELETE, "/api/v1/insights", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "idle");

    let (status, _) = send_json(&app, Method::POST, "/api/v1/insights/save", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/api/v1/reports/{}", report["id"].as_str().unwrap());
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(&app, Method::DELETE, &format!("{}?confirm=true", uri), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, reports) = send_json(&app, Method::GET, "/api/v1/reports", None).await;
    assert!(reports.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_insight_failure_surfaces_as_bad_gateway() {
    let app = app_with(
        Arc::new(StaticAnalysisClient::failing("upstream down")),
        Arc::new(StaticExtractionClient::returning(Vec::new())),
    );
    send_json(&app, Method::POST, "/api/v1/records", Some(measurement(120, 80, 10))).await;

    let (status, body) = send_json(&app, Method::POST, "/api/v1/insights", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "analysis_failed");

    let (_, state) = send_json(&app, Method::GET, "/api/v1/insights", None).await;
    assert_eq!(state["state"], "failed");
}

#[tokio::test]
async fn test_concurrent_insight_request_is_rejected() {
    let gate = GatedAnalysisClient::new();
    let app = app_with(gate.clone(), Arc::new(StaticExtractionClient::returning(Vec::new())));
    send_json(&app, Method::POST, "/api/v1/records", Some(measurement(120, 80, 10))).await;

    let first = {
        let app = app.clone();
        tokio::spawn(async move { send_json(&app, Method::POST, "/api/v1/insights", None).await })
    };
    gate.wait_entered().await;

    let (_, state) = send_json(&app, Method::GET, "/api/v1/insights", None).await;
    assert_eq!(state["state"], "requesting");

    let (status, body) = send_json(&app, Method::POST, "/api/v1/insights", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, _) = send_json(&app, Method::DELETE, "/api/v1/insights", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    gate.release();
    let (status, body) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "analysis of 1 records");
}

#[tokio::test]
async fn test_swagger_document_served() {
    let app = test_app();

    let (status, doc) = send_json(&app, Method::GET, "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "BpTracker API");
}

#[tokio::test]
async fn test_no_cors_headers_without_allowed_origins() {
    let app = test_app();

    let request = Request::get("/api/v1/records")
        .header(header::ORIGIN, "https://elsewhere.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_cors_limited_to_configured_origins() {
    initialize();
    let (store, _storage) = memory_store().unwrap();
    let state = AppState::new(
        Arc::new(store),
        Arc::new(StaticAnalysisClient::replying("x")),
        Arc::new(StaticExtractionClient::returning(Vec::new())),
        configured_ai(),
    );
    let app = create_app(state, &[HeaderValue::from_static("http://localhost:5173")]);

    let allowed = Request::get("/api/v1/records")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(allowed).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );

    let foreign = Request::get("/api/v1/records")
        .header(header::ORIGIN, "https://elsewhere.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(foreign).await.unwrap();
    assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
