use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;
use tower::ServiceExt;
use vigil_config::GlobalConfig;
use vigil_core::AlertConfigRecord;
use vigil_server::VigilApp;

/// An app whose snapshot holds one crash group first seen just now.
async fn create_test_app() -> (VigilApp, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let now = chrono::Utc::now();
    let snapshot = json!({
        "entities": [{"id": "app-1", "name": "Shop"}],
        "events": [{
            "feed": "crashgroups",
            "id": "c-1",
            "entity_id": "app-1",
            "first_seen": now,
            "last_seen": now,
            "is_new": true,
            "payload": "Fatal\nat main"
        }]
    });
    let path = dir.path().join("snapshot.json");
    fs::write(&path, snapshot.to_string()).unwrap();

    let mut global = GlobalConfig::default();
    global.data.snapshot = Some(path);

    let mut record = AlertConfigRecord::new("fresh", "New crashes", "new-event");
    record.selected_apps = vec!["app-1".to_string()];
    record.alert_values = vec!["ops@example.com".to_string()];

    let app = VigilApp::build(global, vec![record]).await.unwrap();
    (app, dir)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = create_test_app().await;

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_list_alerts() {
    let (app, _dir) = create_test_app().await;

    let request = Request::builder()
        .uri("/api/v1/alerts")
        .body(Body::empty())
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["alerts"][0]["id"], "fresh");
}

#[tokio::test]
async fn test_run_alert_fires_and_is_recorded() {
    let (app, _dir) = create_test_app().await;

    let request = Request::builder()
        .uri("/api/v1/alerts/fresh/run")
        .method("POST")
        .body(Body::empty())
        .unwrap();
    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let execution = body_json(response).await;
    assert_eq!(execution["status"], "fired");
    assert_eq!(execution["matched"], 1);
    assert_eq!(execution["delivery"]["attempted"], 1);

    let request = Request::builder()
        .uri("/api/v1/executions?alert_id=fresh")
        .body(Body::empty())
        .unwrap();
    let response = app.router().oneshot(request).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["executions"].as_array().unwrap().len(), 1);

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("vigil_alerts_fired_total{alert=\"fresh\"} 1"));
}

#[tokio::test]
async fn test_run_unknown_alert() {
    let (app, _dir) = create_test_app().await;

    let request = Request::builder()
        .uri("/api/v1/alerts/missing/run")
        .method("POST")
        .body(Body::empty())
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_run_once_and_shutdown() {
    let (app, _dir) = create_test_app().await;

    let execution = app.run_once("fresh").await.unwrap();
    assert_eq!(execution.matched, 1);

    app.shutdown().await.unwrap();
}
