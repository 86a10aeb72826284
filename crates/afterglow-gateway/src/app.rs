use axum::{routing::get, Router};
use afterglow_core::AfterglowConfig;
use afterglow_scheduler::SchedulerHandle;
use chrono::{DateTime, FixedOffset};
use std::sync::Arc;

use crate::http;

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: AfterglowConfig,
    pub scheduler: SchedulerHandle,
}

impl AppState {
    pub fn new(config: AfterglowConfig, scheduler: SchedulerHandle) -> Self {
        Self { config, scheduler }
    }

    /// Current time in the configured offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.scheduler.now()
    }

    /// Bearer token guarding `/trigger-push`, if one is configured.
    pub fn trigger_token(&self) -> Option<&str> {
        self.config
            .server
            .trigger_token
            .as_deref()
            .filter(|t| !t.is_empty())
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(http::health::health_handler))
        .route("/config", get(http::config::config_handler))
        .route("/sunset-time", get(http::sunset::sunset_time_handler))
        .route(
            "/trigger-push",
            get(http::trigger::trigger_push_handler).post(http::trigger::trigger_push_handler),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use afterglow_core::{AfterglowError, TriggerPolicy};
    use afterglow_scheduler::{clock::TokioClock, SchedulerEngine, ScheduleSettings, Task};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    /// Task with a fixed outcome.
    pub struct FakeTask(pub Option<fn() -> AfterglowError>);

    #[async_trait]
    impl Task for FakeTask {
        fn name(&self) -> &str {
            "fake"
        }

        async fn run(&self) -> afterglow_core::Result<String> {
            match self.0 {
                None => Ok("中等烧 (0.250)".to_string()),
                Some(make_err) => Err(make_err()),
            }
        }
    }

    /// Router over a scheduler whose clock starts at the given local time in
    /// Shanghai (UTC+8). The engine itself is never started.
    pub fn app_at(
        local: (u32, u32, u32),
        policy: TriggerPolicy,
        task: FakeTask,
        token: Option<&str>,
    ) -> Router {
        let mut config = AfterglowConfig::default();
        config.webhook.url = "http://127.0.0.1:9/unused".to_string();
        config.schedule.trigger = policy;
        config.server.trigger_token = token.map(String::from);

        let (day, hour, minute) = local;
        let origin = config
            .location
            .offset()
            .unwrap()
            .with_ymd_and_hms(2024, 6, day, hour, minute, 0)
            .unwrap()
            .with_timezone(&Utc);
        let settings = ScheduleSettings::from_config(&config).unwrap();
        let (_engine, handle) = SchedulerEngine::new(
            settings,
            Arc::new(task),
            Arc::new(TokioClock::starting_at(origin)),
        );
        build_router(Arc::new(AppState::new(config, handle)))
    }

    pub async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        call(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }
}
