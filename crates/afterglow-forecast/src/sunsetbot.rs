use std::time::Duration;

use afterglow_core::config::UpstreamConfig;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ForecastError;
use crate::source::{ForecastReport, ForecastSource};

/// Query ids the SunsetBot web UI sends; the API rejects requests without one.
const DETAILED_QUERY_ID: u32 = 8_454_963;
const SIMPLE_QUERY_ID: u32 = 1_344_491;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Where and what to ask SunsetBot for.
#[derive(Debug, Clone)]
pub struct SunsetBotTarget {
    pub base_url: String,
    /// City in `省-市` form, e.g. `上海市-上海`.
    pub city: String,
    pub model: String,
    pub event: String,
    pub timeout: Duration,
}

impl SunsetBotTarget {
    pub fn from_config(upstream: &UpstreamConfig, city: &str) -> Self {
        Self {
            base_url: upstream.base_url.trim_end_matches('/').to_string(),
            city: city.to_string(),
            model: upstream.model.clone(),
            event: upstream.event.clone(),
            timeout: Duration::from_secs(upstream.timeout_secs),
        }
    }

    /// The bare city the simple endpoint expects: `上海市-上海` → `上海`.
    pub fn short_city(&self) -> &str {
        match self.city.split_once('-') {
            Some((_, city)) if !city.is_empty() => city,
            _ => &self.city,
        }
    }

    fn client(&self) -> Result<reqwest::Client, ForecastError> {
        Ok(reqwest::Client::builder().timeout(self.timeout).build()?)
    }
}

/// `GET /detailed/` keyed by the full city name in the query string.
pub struct SunsetBotDetailed {
    client: reqwest::Client,
    target: SunsetBotTarget,
}

impl SunsetBotDetailed {
    pub fn new(target: SunsetBotTarget) -> Result<Self, ForecastError> {
        Ok(Self {
            client: target.client()?,
            target,
        })
    }

    pub fn url(&self) -> String {
        let t = &self.target;
        format!(
            "{}/detailed/?query_id={DETAILED_QUERY_ID}&intend=select_city&query_city={}\
             &model={}&event_date=None&event={}&times=None",
            t.base_url,
            urlencoding::encode(&t.city),
            urlencoding::encode(&t.model),
            urlencoding::encode(&t.event),
        )
    }
}

#[async_trait]
impl ForecastSource for SunsetBotDetailed {
    fn name(&self) -> &str {
        "sunsetbot-detailed"
    }

    async fn fetch(&self) -> Result<ForecastReport, ForecastError> {
        let url = self.url();
        debug!(%url, "requesting detailed forecast");

        let req = self
            .client
            .get(&url)
            .header("Referer", format!("{}/detailed/", self.target.base_url));
        let report = send(req).await?;

        if report.status == "not_found" {
            return Err(ForecastError::NotFound {
                city: self.target.city.clone(),
                summary: report.img_summary,
            });
        }
        if report.quality.is_empty() {
            return Err(ForecastError::Empty {
                status: report.status,
            });
        }
        Ok(report)
    }
}

/// `GET /` with the city carried in a `city_name` cookie.
pub struct SunsetBotSimple {
    client: reqwest::Client,
    target: SunsetBotTarget,
}

impl SunsetBotSimple {
    pub fn new(target: SunsetBotTarget) -> Result<Self, ForecastError> {
        Ok(Self {
            client: target.client()?,
            target,
        })
    }

    pub fn url(&self) -> String {
        let t = &self.target;
        format!(
            "{}/?query_id={SIMPLE_QUERY_ID}&intend=select_city&query_city=\
             &event_date=None&event={}&times=None&model={}",
            t.base_url,
            urlencoding::encode(&t.event),
            urlencoding::encode(&t.model),
        )
    }

    /// The cookie value is the quoted city, percent-encoded as a whole.
    pub fn cookie(&self) -> String {
        let quoted = format!("\"{}\"", self.target.short_city());
        format!("city_name={}", urlencoding::encode(&quoted))
    }
}

#[async_trait]
impl ForecastSource for SunsetBotSimple {
    fn name(&self) -> &str {
        "sunsetbot-simple"
    }

    async fn fetch(&self) -> Result<ForecastReport, ForecastError> {
        let url = self.url();
        debug!(%url, city = %self.target.short_city(), "requesting simple forecast");

        let req = self
            .client
            .get(&url)
            .header("Referer", format!("{}/", self.target.base_url))
            .header("Cookie", self.cookie());
        let report = send(req).await?;

        if report.status != "ok" {
            return Err(ForecastError::BadStatus(report.status));
        }
        if report.quality.is_empty() {
            return Err(ForecastError::Empty {
                status: report.status,
            });
        }
        Ok(report)
    }
}

/// Shared request tail: browser-like headers, status check, JSON decode.
async fn send(req: reqwest::RequestBuilder) -> Result<ForecastReport, ForecastError> {
    let resp = req
        .header("Accept", "*/*")
        .header("Accept-Language", "zh-CN,zh;q=0.9")
        .header("User-Agent", USER_AGENT)
        .header("X-Requested-With", "XMLHttpRequest")
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %text, "SunsetBot API error");
        return Err(ForecastError::Api {
            status: status.as_u16(),
            message: text,
        });
    }

    let text = resp.text().await?;
    let report: ForecastReport =
        serde_json::from_str(&text).map_err(|e| ForecastError::Decode(e.to_string()))?;

    debug!(
        status = %report.status,
        city = %report.display_city_name,
        quality = %report.quality,
        event_time = %report.event_time,
        aod = %report.aod,
        "forecast received"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(city: &str) -> SunsetBotTarget {
        SunsetBotTarget {
            base_url: "https://sunsetbot.top".into(),
            city: city.into(),
            model: "EC".into(),
            event: "set_1".into(),
            timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn detailed_url_encodes_the_full_city() {
        let source = SunsetBotDetailed::new(target("上海市-上海")).unwrap();
        assert_eq!(
            source.url(),
            "https://sunsetbot.top/detailed/?query_id=8454963&intend=select_city\
             &query_city=%E4%B8%8A%E6%B5%B7%E5%B8%82-%E4%B8%8A%E6%B5%B7\
             &model=EC&event_date=None&event=set_1&times=None"
        );
    }

    #[test]
    fn simple_source_sends_short_city_cookie() {
        let source = SunsetBotSimple::new(target("上海市-上海")).unwrap();
        assert_eq!(source.cookie(), "city_name=%22%E4%B8%8A%E6%B5%B7%22");
        assert!(source.url().contains("query_id=1344491"));
        assert!(source.url().ends_with("&model=EC"));
    }

    #[test]
    fn short_city_without_province() {
        assert_eq!(target("北京").short_city(), "北京");
        assert_eq!(target("广东省-").short_city(), "广东省-");
        assert_eq!(target("广东省-深圳").short_city(), "深圳");
    }

    #[test]
    fn from_config_strips_trailing_slash() {
        let upstream = UpstreamConfig {
            base_url: "http://127.0.0.1:9000/".into(),
            ..UpstreamConfig::default()
        };
        let t = SunsetBotTarget::from_config(&upstream, "上海市-上海");
        assert_eq!(t.base_url, "http://127.0.0.1:9000");
        assert_eq!(t.timeout, Duration::from_secs(10));
    }
}
