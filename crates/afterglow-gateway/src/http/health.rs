use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use super::format_time;
use crate::app::AppState;

/// GET /health: liveness probe, returns server metadata.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": format_time(&state.now()),
        "timezone": state.config.location.timezone_label,
    }))
}
