//! Calendar date to continuous day count.

use chrono::{Datelike, NaiveDate};

/// Julian Day of the J2000.0 epoch, 2000-01-01T12:00 TT.
pub const J2000: f64 = 2_451_545.0;

/// Days in a Julian century.
pub const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Julian Day number at 0h UT of a Gregorian calendar date.
///
/// January and February count as months 13 and 14 of the previous year so
/// that the leap day falls at the end of the counting year.
pub fn julian_day(date: NaiveDate) -> f64 {
    let mut year = date.year() as f64;
    let mut month = date.month() as f64;
    let day = date.day() as f64;

    if month <= 2.0 {
        year -= 1.0;
        month += 12.0;
    }

    let a = (year / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    (365.25 * (year + 4716.0)).floor() + (30.6001 * (month + 1.0)).floor() + day + b - 1524.5
}

/// Julian centuries elapsed since J2000.0.
pub fn centuries_since_j2000(julian_day: f64) -> f64 {
    (julian_day - J2000) / DAYS_PER_CENTURY
}
