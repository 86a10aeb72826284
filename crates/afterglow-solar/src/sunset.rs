use afterglow_core::GeoCoordinate;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::Serialize;

use crate::julian::{centuries_since_j2000, julian_day};
use crate::position::SolarPosition;

/// Geometric horizon plus 34' of refraction and 16' of solar semi-diameter.
pub const SUNSET_ZENITH_DEG: f64 = 90.833;

const MINUTES_PER_DAY: f64 = 1440.0;
const LAST_SECOND_OF_DAY: u32 = 86_399;

/// Whether the sun actually crossed the horizon on the requested date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCondition {
    Normal,
    /// Sun stays above the horizon; the instant is the next solar midnight.
    PolarDay,
    /// Sun stays below the horizon; the instant is solar noon.
    PolarNight,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolarEvent {
    pub instant: DateTime<FixedOffset>,
    pub condition: DayCondition,
}

/// Local civil sunset for `date` at (`latitude`, `longitude`), in `offset`.
///
/// Deterministic and infallible; see [`solar_event`] for the polar cases.
pub fn compute_sunset(
    latitude: f64,
    longitude: f64,
    date: NaiveDate,
    offset: FixedOffset,
) -> DateTime<FixedOffset> {
    solar_event(latitude, longitude, date, offset).instant
}

/// [`compute_sunset`] for a configured [`GeoCoordinate`].
pub fn sunset_at(
    location: &GeoCoordinate,
    date: NaiveDate,
    offset: FixedOffset,
) -> DateTime<FixedOffset> {
    compute_sunset(location.latitude, location.longitude, date, offset)
}

/// Sunset together with the polar classification of the day.
///
/// The returned instant may fall on the calendar day before or after `date`
/// when the offset is far from the location's solar time (e.g. a UTC clock
/// near the antimeridian); date and time are always self-consistent.
pub fn solar_event(
    latitude: f64,
    longitude: f64,
    date: NaiveDate,
    offset: FixedOffset,
) -> SolarEvent {
    let sun = SolarPosition::at(centuries_since_j2000(julian_day(date)));
    let (cos_hour_angle, condition) = sunset_hour_angle_cos(latitude, sun.declination);
    let hour_angle = cos_hour_angle.acos().to_degrees();

    // Solar noon at Greenwich is 720 min; each degree of hour angle or
    // longitude is four minutes of time.
    let utc_minutes = 720.0 + 4.0 * hour_angle - 4.0 * longitude - sun.equation_of_time;
    let local_minutes = utc_minutes + f64::from(offset.local_minus_utc()) / 60.0;

    let local = civil_datetime(date, local_minutes);
    let utc = local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));

    SolarEvent {
        instant: DateTime::from_naive_utc_and_offset(utc, offset),
        condition,
    }
}

/// Cosine of the sunset hour angle, clamped to [-1, 1].
fn sunset_hour_angle_cos(latitude: f64, declination: f64) -> (f64, DayCondition) {
    let lat = latitude.to_radians();
    let zenith = SUNSET_ZENITH_DEG.to_radians();
    let cos_ha = (zenith.cos() - lat.sin() * declination.sin()) / (lat.cos() * declination.cos());

    if cos_ha > 1.0 {
        (1.0, DayCondition::PolarNight)
    } else if cos_ha < -1.0 {
        (-1.0, DayCondition::PolarDay)
    } else {
        (cos_ha, DayCondition::Normal)
    }
}

/// Turn minutes past local midnight of `date` into a (date, time) pair,
/// rolling the date when the minutes leave [0, 1440). Seconds truncate.
pub(crate) fn civil_datetime(date: NaiveDate, local_minutes: f64) -> NaiveDateTime {
    let day_shift = (local_minutes / MINUTES_PER_DAY).floor();
    let minutes_of_day = local_minutes - day_shift * MINUTES_PER_DAY;
    let seconds = ((minutes_of_day * 60.0).floor() as u32).min(LAST_SECOND_OF_DAY);

    let date = date
        .checked_add_signed(TimeDelta::days(day_shift as i64))
        .unwrap_or(date);
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or(NaiveTime::MIN);
    date.and_time(time)
}
