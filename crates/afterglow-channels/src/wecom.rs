//! WeCom (企业微信) group robot webhook.

use std::time::Duration;

use afterglow_core::config::WebhookConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{
    channel::Channel,
    error::ChannelError,
    types::OutboundMessage,
};

pub struct WeComWebhook {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

/// `{"errcode":0,"errmsg":"ok"}` on success.
#[derive(Debug, Deserialize)]
struct WeComReply {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

impl WeComWebhook {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ChannelError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ChannelError::ConfigError("webhook URL is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChannelError::ConfigError(e.to_string()))?;
        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    pub fn from_config(config: &WebhookConfig) -> Result<Self, ChannelError> {
        Self::new(config.url.clone(), Duration::from_secs(config.timeout_secs))
    }
}

/// The robot API's markdown request body.
fn payload(msg: &OutboundMessage) -> Value {
    json!({
        "msgtype": "markdown",
        "markdown": { "content": msg.content },
    })
}

#[async_trait]
impl Channel for WeComWebhook {
    fn name(&self) -> &str {
        "wecom"
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        debug!(bytes = msg.content.len(), "posting to WeCom webhook");

        let resp = self
            .client
            .post(&self.url)
            .json(&payload(msg))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChannelError::Timeout {
                        ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    ChannelError::SendFailed(e.to_string())
                }
            })?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            warn!(status = status.as_u16(), body = %body, "WeCom webhook rejected message");
            return Err(ChannelError::SendFailed(format!(
                "webhook returned status {}",
                status.as_u16()
            )));
        }

        // Some proxies answer 200 with an empty body; treat that as delivered.
        if let Ok(reply) = serde_json::from_str::<WeComReply>(&body) {
            if reply.errcode != 0 {
                warn!(errcode = reply.errcode, errmsg = %reply.errmsg, "WeCom API error");
                return Err(ChannelError::Api {
                    code: reply.errcode,
                    message: reply.errmsg,
                });
            }
        }
        Ok(())
    }
}
