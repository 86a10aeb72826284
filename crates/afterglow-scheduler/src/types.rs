use std::time::Duration;

use afterglow_core::{AfterglowConfig, GeoCoordinate, TriggerPolicy};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Result of the most recent loop execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
    /// Nothing has run since the process started.
    #[default]
    Unknown,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Loop bookkeeping, published as snapshots through a watch channel.
///
/// Only the engine writes it. Nothing here survives a restart: a new
/// process recomputes `next_fire` from the current wall time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchedulerState {
    /// Next instant the loop will execute the task, once computed.
    pub next_fire: Option<DateTime<FixedOffset>>,
    pub last_outcome: Outcome,
    /// When the most recent loop execution started.
    pub last_run: Option<DateTime<FixedOffset>>,
    /// Error text of the most recent failure, cleared on success.
    pub last_error: Option<String>,
    /// Loop executions since startup (manual triggers excluded).
    pub runs: u32,
}

/// Everything the engine needs to decide when to fire.
#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    pub policy: TriggerPolicy,
    pub location: GeoCoordinate,
    pub offset: FixedOffset,
    pub success_cooldown: Duration,
    pub failure_backoff: Duration,
}

impl ScheduleSettings {
    /// Build from validated config.
    pub fn from_config(config: &AfterglowConfig) -> afterglow_core::Result<Self> {
        Ok(Self {
            policy: config.schedule.trigger,
            location: config.location.coordinate(),
            offset: config.location.offset()?,
            success_cooldown: Duration::from_secs(config.schedule.success_cooldown_secs),
            failure_backoff: Duration::from_secs(config.schedule.failure_backoff_secs),
        })
    }
}

/// What a manual trigger reports back to its caller.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerReport {
    /// One-line summary returned by the task, e.g. the quality tier sent.
    pub summary: String,
    pub started_at: DateTime<FixedOffset>,
    pub finished_at: DateTime<FixedOffset>,
}
