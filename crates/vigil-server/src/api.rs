use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;
use vigil_notify::PrometheusAlertCounter;
use vigil_rule::{AlertEngine, TriggerManager};

const DEFAULT_HISTORY_LIMIT: usize = 100;
const MAX_HISTORY_LIMIT: usize = 1000;

pub struct ApiState {
    pub engine: Arc<AlertEngine>,
    pub trigger: Arc<TriggerManager>,
    pub counter: Arc<PrometheusAlertCounter>,
}

#[derive(Debug, Deserialize)]
pub struct ExecutionQuery {
    pub alert_id: Option<String>,
    pub limit: Option<usize>,
}

pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/metrics", get(metrics))
        .route("/api/v1/alerts", get(list_alerts))
        .route("/api/v1/alerts/:alert_id/run", post(run_alert))
        .route("/api/v1/executions", get(list_executions))
        .with_state(state)
}

async fn metrics(State(state): State<Arc<ApiState>>) -> Response {
    match state.counter.gather_text() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn list_alerts(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let alerts = state.engine.storage().list().await;
    Json(json!({ "alerts": alerts }))
}

async fn run_alert(
    State(state): State<Arc<ApiState>>,
    Path(alert_id): Path<String>,
) -> Response {
    if state.engine.storage().get(&alert_id).await.is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Alert not found: {}", alert_id) })),
        )
            .into_response();
    }

    match state.trigger.trigger(&alert_id).await {
        Some(execution) => (StatusCode::OK, Json(execution)).into_response(),
        None => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "A run of this alert is already in flight" })),
        )
            .into_response(),
    }
}

async fn list_executions(
    State(state): State<Arc<ApiState>>,
    Query(q): Query<ExecutionQuery>,
) -> impl IntoResponse {
    let limit = q
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);
    let executions = state
        .engine
        .execution_history(q.alert_id.as_deref(), limit)
        .await;

    Json(json!({ "executions": executions }))
}
