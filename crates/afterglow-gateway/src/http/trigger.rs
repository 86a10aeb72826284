//! Manual push endpoint: GET|POST /trigger-push.
//!
//! Runs the push task immediately, independent of the scheduled loop. When
//! `server.trigger_token` is set the request must carry
//! `Authorization: Bearer <token>`.

use afterglow_core::AfterglowError;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use super::format_time;
use crate::app::AppState;

pub async fn trigger_push_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if let Some(expected) = state.trigger_token() {
        verify_bearer_token(&headers, expected).map_err(|e| auth_error(&e))?;
    }

    let request_id = uuid::Uuid::new_v4().to_string();
    info!(request_id = %request_id, "manual push requested");

    match state.scheduler.trigger_now().await {
        Ok(report) => Ok(Json(json!({
            "status": "success",
            "message": format!("消息发送成功: {}", report.summary),
            "timestamp": format_time(&report.finished_at),
            "request_id": request_id,
        }))),
        Err(e) => {
            warn!(request_id = %request_id, code = e.code(), error = %e, "manual push failed");
            Err((
                status_for(&e),
                Json(json!({
                    "status": "error",
                    "code": e.code(),
                    "error": format!("推送失败: {e}"),
                    "request_id": request_id,
                })),
            ))
        }
    }
}

/// 502 when a remote collaborator failed, 500 for everything else.
fn status_for(err: &AfterglowError) -> StatusCode {
    match err {
        AfterglowError::UpstreamFetch(_) | AfterglowError::Send(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Verify a static bearer token in the `Authorization: Bearer <token>` header.
fn verify_bearer_token(headers: &HeaderMap, expected: &str) -> Result<(), String> {
    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| "missing Authorization header".to_string())?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| "Authorization header must use Bearer scheme".to_string())?;

    if token == expected {
        Ok(())
    } else {
        Err("bearer token mismatch".to_string())
    }
}

fn auth_error(reason: &str) -> (StatusCode, Json<Value>) {
    warn!(reason = %reason, "trigger authentication failed");
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"status": "error", "code": "UNAUTHORIZED", "error": reason})),
    )
}
