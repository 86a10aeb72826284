use afterglow_core::{GeoCoordinate, TriggerPolicy};
use afterglow_solar::{solar_event, sunset_at, SolarEvent};
use chrono::{DateTime, Days, FixedOffset, NaiveDate, TimeDelta, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SchedulerError};

/// How many times the candidate date may move forward before giving up.
///
/// One advance is the normal "today already passed" case. A sunset for date
/// D can land as early as D-1 05:44 local (UTC-18 at 180°E), so a lead just
/// under a day reaches back to D-2; three advances cover every offset and
/// lead the config accepts. Anything beyond is a bad policy.
pub const MAX_DAY_ADVANCES: u32 = 3;

/// A computed fire instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NextFire {
    pub at: DateTime<FixedOffset>,
    /// The sunset `at` was derived from; `None` for fixed-time policies.
    pub sunset: Option<DateTime<FixedOffset>>,
}

/// Compute the next fire instant strictly after `now`.
///
/// Starts from today's local date in `offset` and advances one day at a
/// time, at most [`MAX_DAY_ADVANCES`] times. An instant equal to `now`
/// counts as passed.
pub fn compute_next_fire(
    policy: &TriggerPolicy,
    location: &GeoCoordinate,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Result<NextFire> {
    let today = now.with_timezone(&offset).date_naive();

    for advance in 0..=MAX_DAY_ADVANCES {
        let date = today
            .checked_add_days(Days::new(u64::from(advance)))
            .ok_or_else(|| SchedulerError::InvalidPolicy(format!("date overflow after {today}")))?;
        let candidate = candidate_on(policy, location, offset, date)?;
        if candidate.at.with_timezone(&Utc) > now {
            return Ok(candidate);
        }
        debug!(%date, at = %candidate.at, "candidate already passed, advancing a day");
    }

    Err(SchedulerError::NoFutureTarget {
        policy: *policy,
        advances: MAX_DAY_ADVANCES,
    })
}

/// The policy's fire instant on a given local date, ignoring `now`.
fn candidate_on(
    policy: &TriggerPolicy,
    location: &GeoCoordinate,
    offset: FixedOffset,
    date: NaiveDate,
) -> Result<NextFire> {
    match *policy {
        TriggerPolicy::FixedTime { hour, minute } => {
            let at = date
                .and_hms_opt(u32::from(hour), u32::from(minute), 0)
                .and_then(|local| local.and_local_timezone(offset).single())
                .ok_or_else(|| {
                    SchedulerError::InvalidPolicy(format!(
                        "{hour:02}:{minute:02} is not a valid time of day"
                    ))
                })?;
            Ok(NextFire { at, sunset: None })
        }

        TriggerPolicy::SolarRelative { lead_minutes } => {
            let sunset = sunset_at(location, date, offset);
            Ok(NextFire {
                at: sunset - TimeDelta::minutes(i64::from(lead_minutes)),
                sunset: Some(sunset),
            })
        }
    }
}

/// The next sunset that has not happened yet: today's, else tomorrow's.
pub fn upcoming_sunset(
    location: &GeoCoordinate,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> SolarEvent {
    let mut date = now.with_timezone(&offset).date_naive();
    let mut event = solar_event(location.latitude, location.longitude, date, offset);
    for _ in 0..MAX_DAY_ADVANCES {
        if event.instant.with_timezone(&Utc) > now {
            break;
        }
        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
        event = solar_event(location.latitude, location.longitude, date, offset);
    }
    event
}
