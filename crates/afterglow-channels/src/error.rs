use afterglow_core::AfterglowError;
use thiserror::Error;

/// Errors that can occur while delivering a message.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Transport failure or a non-2xx response.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The endpoint accepted the request but reported an application error.
    #[error("Channel API error {code}: {message}")]
    Api { code: i64, message: String },

    /// An operation exceeded its allowed time budget.
    #[error("Operation timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The channel-specific configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<ChannelError> for AfterglowError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::ConfigError(msg) => AfterglowError::Config(msg),
            other => AfterglowError::Send(other.to_string()),
        }
    }
}
