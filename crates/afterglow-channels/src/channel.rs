use async_trait::async_trait;

use crate::{error::ChannelError, types::OutboundMessage};

/// Common interface for every push target.
///
/// Webhook channels are connectionless, so there is no connect/disconnect
/// step: each `send` is one self-contained HTTP request.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Stable lowercase identifier for this channel (e.g. `"wecom"`).
    fn name(&self) -> &str;

    /// Deliver a single outbound message.
    ///
    /// `&self` so the scheduled push and a manual trigger can send
    /// concurrently through the same channel.
    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError>;
}
