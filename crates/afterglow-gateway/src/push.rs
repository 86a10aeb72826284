//! The daily push: fetch, classify, render, send.

use std::sync::Arc;

use afterglow_channels::{Channel, OutboundMessage, WeComWebhook};
use afterglow_core::{AfterglowConfig, AfterglowError, GeoCoordinate};
use afterglow_forecast::{
    parse_quality, render, ForecastSource, MessageInput, QualityLevel, SourceRouter,
};
use afterglow_scheduler::{Clock, Task};
use afterglow_solar::sunset_at;
use async_trait::async_trait;
use chrono::FixedOffset;
use tracing::{debug, info};

pub struct PushTask {
    forecast: Box<dyn ForecastSource>,
    channel: Box<dyn Channel>,
    location: GeoCoordinate,
    offset: FixedOffset,
    clock: Arc<dyn Clock>,
}

impl PushTask {
    pub fn new(
        forecast: Box<dyn ForecastSource>,
        channel: Box<dyn Channel>,
        location: GeoCoordinate,
        offset: FixedOffset,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            forecast,
            channel,
            location,
            offset,
            clock,
        }
    }

    /// SunsetBot (detailed, then simple) into the WeCom webhook.
    pub fn from_config(
        config: &AfterglowConfig,
        clock: Arc<dyn Clock>,
    ) -> afterglow_core::Result<Self> {
        let forecast = SourceRouter::sunsetbot(&config.upstream, &config.location.city)?;
        let channel = WeComWebhook::from_config(&config.webhook)?;
        info!(
            sources = ?forecast.source_names(),
            channel = channel.name(),
            city = %config.location.city,
            "push pipeline ready"
        );
        Ok(Self::new(
            Box::new(forecast),
            Box::new(channel),
            config.location.coordinate(),
            config.location.offset()?,
            clock,
        ))
    }
}

#[async_trait]
impl Task for PushTask {
    fn name(&self) -> &str {
        "sunset-push"
    }

    async fn run(&self) -> Result<String, AfterglowError> {
        let report = self.forecast.fetch().await?;
        let value = parse_quality(&report.quality)?;
        let level = QualityLevel::classify(value);
        debug!(value, level = %level, raw = %report.quality, "forecast classified");

        let now = self.clock.now().with_timezone(&self.offset);
        let content = render(&MessageInput {
            level,
            event_time: &report.event_time,
            aod: &report.aod,
            computed_sunset: sunset_at(&self.location, now.date_naive(), self.offset),
            pushed_at: now,
        });

        self.channel
            .send(&OutboundMessage::markdown(content))
            .await?;

        info!(channel = %self.channel.name(), level = %level, value, "push delivered");
        Ok(format!("{} ({value:.3})", level.label()))
    }
}
