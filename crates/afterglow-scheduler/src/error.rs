use afterglow_core::{AfterglowError, TriggerPolicy};
use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
///
/// Every variant is a setup problem; transient task failures never surface
/// here, they are recorded in [`crate::SchedulerState`] instead.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The policy produced no future instant within the bounded lookahead.
    #[error("No future fire time for {policy} within {advances} day advances")]
    NoFutureTarget {
        policy: TriggerPolicy,
        advances: u32,
    },

    /// The policy cannot be turned into a wall-clock time at all.
    #[error("Invalid trigger policy: {0}")]
    InvalidPolicy(String),
}

impl From<SchedulerError> for AfterglowError {
    fn from(err: SchedulerError) -> Self {
        AfterglowError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
