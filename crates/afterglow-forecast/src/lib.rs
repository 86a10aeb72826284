//! Sunset-quality forecasts from SunsetBot and the message they turn into.
//!
//! [`SourceRouter`] tries the detailed endpoint first and falls back to the
//! cookie-based simple one. [`quality`] turns the raw `tb_quality` string
//! into a [`QualityLevel`]; [`message`] renders the Markdown card.

pub mod error;
pub mod message;
pub mod quality;
pub mod router;
pub mod source;
pub mod sunsetbot;

pub use error::ForecastError;
pub use message::{render, MessageInput};
pub use quality::{parse_quality, QualityLevel};
pub use router::SourceRouter;
pub use source::{ForecastReport, ForecastSource};
pub use sunsetbot::{SunsetBotDetailed, SunsetBotSimple, SunsetBotTarget};
