use afterglow_core::config::UpstreamConfig;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::ForecastError;
use crate::source::{ForecastReport, ForecastSource};
use crate::sunsetbot::{SunsetBotDetailed, SunsetBotSimple, SunsetBotTarget};

/// Tries forecast sources in priority order until one answers.
///
/// There is no retry on the same source: a failed daily fetch is retried by
/// the scheduler on its next cycle, not here.
pub struct SourceRouter {
    sources: Vec<Box<dyn ForecastSource>>,
}

impl SourceRouter {
    pub fn new(sources: Vec<Box<dyn ForecastSource>>) -> Self {
        Self { sources }
    }

    /// Detailed endpoint first, cookie-based simple endpoint as fallback.
    pub fn sunsetbot(upstream: &UpstreamConfig, city: &str) -> Result<Self, ForecastError> {
        let target = SunsetBotTarget::from_config(upstream, city);
        Ok(Self::new(vec![
            Box::new(SunsetBotDetailed::new(target.clone())?),
            Box::new(SunsetBotSimple::new(target)?),
        ]))
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

#[async_trait]
impl ForecastSource for SourceRouter {
    fn name(&self) -> &str {
        "router"
    }

    async fn fetch(&self) -> Result<ForecastReport, ForecastError> {
        let mut failures = Vec::with_capacity(self.sources.len());

        for (idx, source) in self.sources.iter().enumerate() {
            match source.fetch().await {
                Ok(report) => {
                    if idx > 0 {
                        info!(source = %source.name(), "forecast served by fallback source");
                    }
                    return Ok(report);
                }
                Err(e) => {
                    warn!(source = %source.name(), err = %e, "forecast source failed");
                    failures.push(format!("{}: {e}", source.name()));
                }
            }
        }

        if failures.is_empty() {
            return Err(ForecastError::Unavailable(
                "no forecast sources configured".to_string(),
            ));
        }
        Err(ForecastError::Unavailable(failures.join("; ")))
    }
}
