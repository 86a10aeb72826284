//! GET /config: effective location and schedule plus live loop state.

use afterglow_core::TriggerPolicy;
use afterglow_scheduler::upcoming_sunset;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use super::format_time;
use crate::app::AppState;

pub async fn config_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let loc = &state.config.location;
    let scheduler = &state.scheduler;
    let snapshot = scheduler.state();
    let policy = scheduler.policy();

    // Before the loop publishes its first target, show what it will pick.
    let next_push = snapshot
        .next_fire
        .or_else(|| scheduler.preview_next_fire().ok().map(|next| next.at));

    let mut body = json!({
        "city": loc.city,
        "latitude": loc.latitude,
        "longitude": loc.longitude,
        "timezone": loc.timezone_label,
        "utc_offset_minutes": loc.utc_offset_minutes,
        "trigger": policy,
        "use_sunset_time": policy.is_solar(),
        "next_push_time": next_push.as_ref().map(format_time),
        "current_time": format_time(&state.now()),
        "last_outcome": snapshot.last_outcome,
        "last_run": snapshot.last_run.as_ref().map(format_time),
        "last_error": snapshot.last_error,
        "runs": snapshot.runs,
    });

    match policy {
        TriggerPolicy::FixedTime { hour, minute } => {
            body["schedule_hour"] = json!(hour);
            body["schedule_minute"] = json!(minute);
        }
        TriggerPolicy::SolarRelative { lead_minutes } => {
            let settings = scheduler.settings();
            let sunset = upcoming_sunset(&settings.location, settings.offset, scheduler.now_utc());
            body["sunset_advance_minutes"] = json!(lead_minutes);
            body["next_sunset_time"] = json!(format_time(&sunset.instant));
        }
    }

    Json(body)
}

#[cfg(test)]
mod tests {
    use crate::app::test_support::{app_at, get, FakeTask};
    use afterglow_core::TriggerPolicy;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn fixed_time_shows_todays_slot() {
        let app = app_at((21, 9, 0), TriggerPolicy::default(), FakeTask(None), None);
        let (status, body) = get(app, "/config").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["city"], "上海市-上海");
        assert_eq!(body["use_sunset_time"], false);
        assert_eq!(body["schedule_hour"], 17);
        assert_eq!(body["schedule_minute"], 30);
        assert_eq!(body["trigger"]["kind"], "fixed_time");
        assert_eq!(body["next_push_time"], "2024-06-21 17:30:00");
        assert_eq!(body["last_outcome"], "unknown");
        assert_eq!(body["runs"], 0);
        assert!(body.get("next_sunset_time").is_none());
    }

    #[tokio::test]
    async fn fixed_time_after_slot_shows_tomorrow() {
        let app = app_at((21, 18, 0), TriggerPolicy::default(), FakeTask(None), None);
        let (_, body) = get(app, "/config").await;
        assert_eq!(body["next_push_time"], "2024-06-22 17:30:00");
    }

    #[tokio::test]
    async fn solar_relative_adds_sunset_fields() {
        let policy = TriggerPolicy::SolarRelative { lead_minutes: 30 };
        let app = app_at((21, 12, 0), policy, FakeTask(None), None);
        let (_, body) = get(app, "/config").await;
        assert_eq!(body["use_sunset_time"], true);
        assert_eq!(body["sunset_advance_minutes"], 30);
        let sunset = body["next_sunset_time"].as_str().unwrap();
        assert!(sunset.starts_with("2024-06-21 19:01"), "{sunset}");
        let push = body["next_push_time"].as_str().unwrap();
        assert!(push.starts_with("2024-06-21 18:31"), "{push}");
        assert!(body.get("schedule_hour").is_none());
    }
}
