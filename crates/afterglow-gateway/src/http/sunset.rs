use afterglow_scheduler::upcoming_sunset;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use super::format_time;
use crate::app::AppState;

/// GET /sunset-time: the next sunset that has not happened yet.
///
/// `condition` is `polar_day` or `polar_night` when the sun does not cross
/// the horizon; `sunset_time` is then the clamped approximation.
pub async fn sunset_time_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let loc = &state.config.location;
    let settings = state.scheduler.settings();
    let event = upcoming_sunset(&settings.location, settings.offset, state.scheduler.now_utc());

    Json(json!({
        "sunset_time": format_time(&event.instant),
        "current_time": format_time(&state.now()),
        "condition": event.condition,
        "latitude": loc.latitude,
        "longitude": loc.longitude,
        "city": loc.city,
    }))
}
