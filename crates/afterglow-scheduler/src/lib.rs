//! `afterglow-scheduler`: once-a-day trigger loop for the sunset push.
//!
//! # Overview
//!
//! [`SchedulerEngine::run`] drives a small state machine:
//!
//! | Phase         | Behaviour                                                    |
//! |---------------|--------------------------------------------------------------|
//! | `ComputeNext` | Next fire instant from the [`TriggerPolicy`], strictly future |
//! | `Sleep`       | One cancellable wait until that instant                      |
//! | `Execute`     | Run the injected [`Task`]                                    |
//! | `Pause`       | Cooldown after success, backoff after failure                |
//!
//! The wait is recomputed from the [`Clock`] every cycle, so wall-clock
//! adjustments correct themselves on the next pass instead of drifting.
//! [`SchedulerHandle`] is the read side: snapshots of the loop state plus a
//! manual trigger that runs the same task outside the loop.
//!
//! [`TriggerPolicy`]: afterglow_core::TriggerPolicy

pub mod clock;
pub mod engine;
pub mod error;
pub mod schedule;
pub mod task;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use engine::{SchedulerEngine, SchedulerHandle};
pub use error::{Result, SchedulerError};
pub use schedule::{compute_next_fire, upcoming_sunset, NextFire};
pub use task::Task;
pub use types::{Outcome, ScheduleSettings, SchedulerState, TriggerReport};
