//! `afterglow-core`: configuration, error taxonomy and the shared domain
//! types used by every other crate in the workspace.

pub mod config;
pub mod error;
pub mod types;

pub use config::AfterglowConfig;
pub use error::{AfterglowError, Result};
pub use types::{GeoCoordinate, TriggerPolicy};
