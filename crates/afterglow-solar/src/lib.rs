//! `afterglow-solar`: local sunset time for any place on Earth.
//!
//! A single-pass, closed-form implementation of the NOAA/Meeus low-precision
//! solar position series. Accuracy is about a minute for latitudes outside
//! the polar circles, which is well inside what a "look at the sky tonight"
//! notification needs.
//!
//! ```
//! use afterglow_solar::compute_sunset;
//! use chrono::{FixedOffset, NaiveDate, Timelike};
//!
//! let shanghai = FixedOffset::east_opt(8 * 3600).unwrap();
//! let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
//! let sunset = compute_sunset(31.2304, 121.4737, date, shanghai);
//! assert_eq!((sunset.hour(), sunset.minute()), (19, 1));
//! ```
//!
//! Inside the polar circles the sun may not cross the horizon at all. The
//! hour angle is clamped instead of failing: polar night yields local solar
//! noon and polar day yields the following solar midnight. [`solar_event`]
//! reports which case applied.

pub mod julian;
pub mod position;
pub mod sunset;

pub use sunset::{compute_sunset, solar_event, sunset_at, DayCondition, SolarEvent};
