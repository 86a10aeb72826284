pub mod channel;
pub mod error;
pub mod types;
pub mod wecom;

pub use channel::Channel;
pub use error::ChannelError;
pub use types::OutboundMessage;
pub use wecom::WeComWebhook;
