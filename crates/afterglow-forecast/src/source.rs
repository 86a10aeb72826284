use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// One forecast as returned by SunsetBot.
///
/// Every field is optional on the wire; missing ones decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    /// Score with a bracketed label, e.g. `0.047（微烧）`.
    #[serde(default, rename = "tb_quality")]
    pub quality: String,
    /// Event time as `%Y-%m-%d %H:%M:%S`, local to the city.
    #[serde(default, rename = "tb_event_time")]
    pub event_time: String,
    /// Aerosol optical depth, pre-formatted.
    #[serde(default, rename = "tb_aod")]
    pub aod: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub img_summary: String,
    #[serde(default)]
    pub display_city_name: String,
}

/// Anything that can produce today's forecast.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Source name for logging and error messages.
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<ForecastReport, ForecastError>;
}
