use std::net::{IpAddr, SocketAddr};

use chrono::FixedOffset;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AfterglowError, Result};
use crate::types::{GeoCoordinate, TriggerPolicy};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_UPSTREAM_URL: &str = "https://sunsetbot.top";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
/// Pause after a successful push so a near-instant task cannot fire twice.
pub const MIN_SUCCESS_COOLDOWN_SECS: u64 = 60;
/// Pause after a failed push before the next target is computed.
pub const MIN_FAILURE_BACKOFF_SECS: u64 = 600;
/// Largest UTC offset chrono (and any real timezone) accepts: ±18 h.
pub const MAX_UTC_OFFSET_MINUTES: i32 = 18 * 60;
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Top-level config (afterglow.toml + AFTERGLOW_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AfterglowConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// When set, POST/GET /trigger-push requires `Authorization: Bearer <token>`.
    #[serde(default)]
    pub trigger_token: Option<String>,
}

impl ServerConfig {
    /// Listen address; `bind` may be IPv4 or IPv6 (`::`).
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind.trim().parse().map_err(|_| {
            AfterglowError::Config(format!("server.bind ({}) is not an IP address", self.bind))
        })?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            trigger_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// City in the upstream's `省-市` form, e.g. "上海市-上海".
    #[serde(default = "default_city")]
    pub city: String,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    /// Local civil time offset east of UTC.
    #[serde(default = "default_offset_minutes")]
    pub utc_offset_minutes: i32,
    /// Human-readable zone name echoed by the status endpoints.
    #[serde(default = "default_timezone_label")]
    pub timezone_label: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            city: default_city(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            utc_offset_minutes: default_offset_minutes(),
            timezone_label: default_timezone_label(),
        }
    }
}

impl LocationConfig {
    pub fn coordinate(&self) -> GeoCoordinate {
        GeoCoordinate::new(self.latitude, self.longitude)
    }

    /// The configured offset as a chrono zone.
    pub fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            AfterglowError::Config(format!(
                "utc_offset_minutes ({}) is outside ±{} minutes",
                self.utc_offset_minutes, MAX_UTC_OFFSET_MINUTES
            ))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub trigger: TriggerPolicy,
    #[serde(default = "default_cooldown")]
    pub success_cooldown_secs: u64,
    #[serde(default = "default_backoff")]
    pub failure_backoff_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            trigger: TriggerPolicy::default(),
            success_cooldown_secs: default_cooldown(),
            failure_backoff_secs: default_backoff(),
        }
    }
}

/// SunsetBot forecast API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub base_url: String,
    /// Forecast model; "EC" (ECMWF) is the more accurate of the two offered.
    #[serde(default = "default_model")]
    pub model: String,
    /// `set_1` is today's sunset, `rise_1` tomorrow's sunrise.
    #[serde(default = "default_event")]
    pub event: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_url(),
            model: default_model(),
            event: default_event(),
            timeout_secs: default_timeout(),
        }
    }
}

/// WeCom (企业微信) group robot webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_city() -> String {
    "上海市-上海".to_string()
}
fn default_latitude() -> f64 {
    31.2304
}
fn default_longitude() -> f64 {
    121.4737
}
fn default_offset_minutes() -> i32 {
    8 * 60
}
fn default_timezone_label() -> String {
    "Asia/Shanghai (UTC+8)".to_string()
}
fn default_cooldown() -> u64 {
    MIN_SUCCESS_COOLDOWN_SECS
}
fn default_backoff() -> u64 {
    MIN_FAILURE_BACKOFF_SECS
}
fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}
fn default_model() -> String {
    "EC".to_string()
}
fn default_event() -> String {
    "set_1".to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

impl AfterglowConfig {
    /// Load config from a TOML file with AFTERGLOW_* env var overrides.
    ///
    /// Nested keys use a double underscore: `AFTERGLOW_WEBHOOK__URL`,
    /// `AFTERGLOW_SCHEDULE__TRIGGER__KIND=solar_relative`.
    /// A missing file is not an error; defaults and env still apply.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        debug!(path = %path, "loading configuration");

        let config: AfterglowConfig = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(&path))
            .merge(Env::prefixed("AFTERGLOW_").split("__"))
            .extract()
            .map_err(|e| AfterglowError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Reject impossible schedules and out-of-range coordinates up front.
    pub fn validate(&self) -> Result<()> {
        self.server.socket_addr()?;

        let loc = &self.location;
        if !loc.coordinate().is_valid() {
            return Err(AfterglowError::Config(format!(
                "coordinates ({}) must be within ±90° latitude and ±180° longitude",
                loc.coordinate()
            )));
        }
        if loc.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(AfterglowError::Config(format!(
                "utc_offset_minutes ({}) is outside ±{}",
                loc.utc_offset_minutes, MAX_UTC_OFFSET_MINUTES
            )));
        }

        match self.schedule.trigger {
            TriggerPolicy::FixedTime { hour, minute } => {
                if hour > 23 || minute > 59 {
                    return Err(AfterglowError::Config(format!(
                        "fixed trigger time {hour:02}:{minute:02} is not a valid time of day"
                    )));
                }
            }
            TriggerPolicy::SolarRelative { lead_minutes } => {
                if lead_minutes >= MINUTES_PER_DAY {
                    return Err(AfterglowError::Config(format!(
                        "lead_minutes ({lead_minutes}) must be less than one day"
                    )));
                }
            }
        }

        if self.schedule.success_cooldown_secs < MIN_SUCCESS_COOLDOWN_SECS {
            return Err(AfterglowError::Config(format!(
                "success_cooldown_secs ({}) must be at least {}",
                self.schedule.success_cooldown_secs, MIN_SUCCESS_COOLDOWN_SECS
            )));
        }
        if self.schedule.failure_backoff_secs < MIN_FAILURE_BACKOFF_SECS {
            return Err(AfterglowError::Config(format!(
                "failure_backoff_secs ({}) must be at least {}",
                self.schedule.failure_backoff_secs, MIN_FAILURE_BACKOFF_SECS
            )));
        }

        if self.webhook.url.trim().is_empty() {
            return Err(AfterglowError::Config(
                "webhook.url is empty; set AFTERGLOW_WEBHOOK__URL".to_string(),
            ));
        }
        if self.upstream.timeout_secs == 0 || self.webhook.timeout_secs == 0 {
            return Err(AfterglowError::Config(
                "HTTP timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    if let Ok(path) = std::env::var("AFTERGLOW_CONFIG") {
        return path;
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.afterglow/afterglow.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn valid() -> AfterglowConfig {
        let mut config = AfterglowConfig::default();
        config.webhook.url = "https://example.invalid/hook".to_string();
        config
    }

    #[test]
    fn defaults_target_shanghai_at_half_past_five() {
        let config = AfterglowConfig::default();
        assert_eq!(config.location.utc_offset_minutes, 480);
        assert_eq!(config.location.coordinate(), GeoCoordinate::new(31.2304, 121.4737));
        assert_eq!(
            config.schedule.trigger,
            TriggerPolicy::FixedTime {
                hour: 17,
                minute: 30
            }
        );
        assert_eq!(config.schedule.failure_backoff_secs, 600);
        assert_eq!(config.schedule.success_cooldown_secs, 60);
    }

    #[test]
    fn validate_accepts_defaults_with_webhook() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_requires_webhook_url() {
        let err = AfterglowConfig::default().validate().unwrap_err();
        assert!(matches!(err, AfterglowError::Config(_)));
    }

    #[test]
    fn validate_rejects_bad_coordinates() {
        let mut config = valid();
        config.location.latitude = 91.0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.location.longitude = -181.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_impossible_times() {
        let mut config = valid();
        config.schedule.trigger = TriggerPolicy::FixedTime {
            hour: 24,
            minute: 0,
        };
        assert!(config.validate().is_err());

        config.schedule.trigger = TriggerPolicy::FixedTime {
            hour: 23,
            minute: 60,
        };
        assert!(config.validate().is_err());

        config.schedule.trigger = TriggerPolicy::SolarRelative {
            lead_minutes: MINUTES_PER_DAY,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_enforces_backoff_floors() {
        let mut config = valid();
        config.schedule.failure_backoff_secs = 599;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.schedule.success_cooldown_secs = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bind_accepts_ipv4_and_ipv6() {
        let mut config = valid();
        assert_eq!(
            config.server.socket_addr().unwrap(),
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );

        config.server.bind = "::".to_string();
        config.server.port = 9090;
        let addr = config.server.socket_addr().unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr, "[::]:9090".parse::<SocketAddr>().unwrap());
        assert!(config.validate().is_ok());

        config.server.bind = "localhost".to_string();
        assert!(config.server.socket_addr().is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn offset_round_trips_through_chrono() {
        let mut config = valid();
        config.location.utc_offset_minutes = -330;
        assert_eq!(config.location.offset().unwrap().local_minus_utc(), -330 * 60);

        config.location.utc_offset_minutes = 24 * 60;
        assert!(config.location.offset().is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_merges_toml_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "afterglow.toml",
                r#"
                [location]
                city = "北京市-北京"
                latitude = 39.9042
                longitude = 116.4074

                [schedule.trigger]
                kind = "solar_relative"
                lead_minutes = 45

                [webhook]
                url = "https://from-file.invalid"
                "#,
            )?;
            jail.set_env("AFTERGLOW_WEBHOOK__URL", "https://from-env.invalid");
            jail.set_env("AFTERGLOW_SERVER__PORT", "9090");

            let config =
                AfterglowConfig::load(Some("afterglow.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.location.city, "北京市-北京");
            assert_eq!(config.location.utc_offset_minutes, 480);
            assert_eq!(
                config.schedule.trigger,
                TriggerPolicy::SolarRelative { lead_minutes: 45 }
            );
            assert_eq!(config.webhook.url, "https://from-env.invalid");
            assert_eq!(config.server.port, 9090);
            assert_eq!(config.upstream.model, "EC");
            Ok(())
        });
    }

    #[test]
    fn env_only_webhook_url_is_enough_to_validate() {
        Jail::expect_with(|jail| {
            jail.set_env("AFTERGLOW_WEBHOOK__URL", "https://from-env.invalid");
            let config =
                AfterglowConfig::load(Some("missing.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.webhook.timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
            assert_eq!(config.upstream.timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
            config.validate().map_err(|e| e.to_string())?;
            Ok(())
        });
    }

    #[test]
    fn default_webhook_timeout_matches_serde_default() {
        assert_eq!(WebhookConfig::default().timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
    }

    #[test]
    fn load_without_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config =
                AfterglowConfig::load(Some("missing.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, DEFAULT_PORT);
            assert_eq!(config.upstream.base_url, DEFAULT_UPSTREAM_URL);
            Ok(())
        });
    }
}
