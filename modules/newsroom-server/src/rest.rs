use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use chrono::Utc;
use tracing::error;

use crate::AppState;

/// Run exactly one cycle and report the outcome. Accepts GET or POST.
/// Lock contention is reported as a clean skip (200), not a failure.
pub async fn trigger_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = Utc::now().to_rfc3339();

    match state.orchestrator.run_cycle().await {
        Ok(Some(stats)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "cycle complete",
                "stats": stats,
                "timestamp": timestamp,
            })),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "skipped: another cycle is already running",
                "stats": serde_json::Value::Null,
                "timestamp": timestamp,
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "cycle run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "message": e.to_string(),
                    "stats": serde_json::Value::Null,
                    "timestamp": timestamp,
                })),
            )
                .into_response()
        }
    }
}

pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
