pub mod config;
pub mod health;
pub mod sunset;
pub mod trigger;

use chrono::{DateTime, FixedOffset};

/// Every timestamp in a response body uses this layout, in the configured offset.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_time(t: &DateTime<FixedOffset>) -> String {
    t.format(TIME_FORMAT).to_string()
}
