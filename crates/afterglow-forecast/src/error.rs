use afterglow_core::AfterglowError;

#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("No forecast for city {city}: {summary}")]
    NotFound { city: String, summary: String },

    #[error("Forecast has no tb_quality (status '{status}')")]
    Empty { status: String },

    #[error("Unexpected upstream status '{0}'")]
    BadStatus(String),

    #[error("Malformed quality '{raw}': {reason}")]
    Quality { raw: String, reason: String },

    #[error("Forecast unavailable: {0}")]
    Unavailable(String),
}

impl From<ForecastError> for AfterglowError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::Quality { .. } => AfterglowError::Parse(err.to_string()),
            other => AfterglowError::UpstreamFetch(other.to_string()),
        }
    }
}
