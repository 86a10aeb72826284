use serde::{Deserialize, Serialize};

/// A Markdown message to be delivered to a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Markdown as understood by the target platform.
    pub content: String,
}

impl OutboundMessage {
    pub fn markdown(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}
