use serde::{Deserialize, Serialize};
use std::fmt;

/// Observer position on the globe, in degrees.
///
/// Latitude is positive north of the equator, longitude positive east of
/// Greenwich. Range checks happen in [`crate::config::AfterglowConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Decides when the daily notification fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerPolicy {
    /// Fire every day at HH:MM local civil time.
    FixedTime { hour: u8, minute: u8 },

    /// Fire `lead_minutes` before the computed local sunset.
    SolarRelative { lead_minutes: u32 },
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        TriggerPolicy::FixedTime {
            hour: 17,
            minute: 30,
        }
    }
}

impl TriggerPolicy {
    pub fn is_solar(&self) -> bool {
        matches!(self, TriggerPolicy::SolarRelative { .. })
    }
}

impl fmt::Display for TriggerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerPolicy::FixedTime { hour, minute } => {
                write!(f, "fixed time {hour:02}:{minute:02}")
            }
            TriggerPolicy::SolarRelative { lead_minutes } => {
                write!(f, "{lead_minutes} min before sunset")
            }
        }
    }
}
