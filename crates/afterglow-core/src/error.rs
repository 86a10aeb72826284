use thiserror::Error;

#[derive(Debug, Error)]
pub enum AfterglowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(String),

    #[error("Malformed quality signal: {0}")]
    Parse(String),

    #[error("Webhook send failed: {0}")]
    Send(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AfterglowError {
    /// Short error code string returned to HTTP clients.
    pub fn code(&self) -> &'static str {
        match self {
            AfterglowError::Config(_) => "CONFIG_ERROR",
            AfterglowError::UpstreamFetch(_) => "UPSTREAM_FETCH_ERROR",
            AfterglowError::Parse(_) => "PARSE_ERROR",
            AfterglowError::Send(_) => "SEND_ERROR",
            AfterglowError::Serialization(_) => "SERIALIZATION_ERROR",
            AfterglowError::Io(_) => "IO_ERROR",
            AfterglowError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the next scheduler cycle may succeed where this one failed.
    ///
    /// Only configuration errors are permanent; everything else is a
    /// transient condition of the day's upstream data or network.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AfterglowError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, AfterglowError>;
