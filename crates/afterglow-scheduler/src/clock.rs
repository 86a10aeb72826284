//! Wall-clock abstraction so the loop can be driven by simulated time.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall clock pinned to `origin` and advanced by tokio's monotonic time.
///
/// Under `#[tokio::test(start_paused = true)]` tokio skips idle sleeps
/// instantly, so a day of scheduler activity runs in microseconds while
/// `now()` still reports the simulated wall time.
#[cfg(any(test, feature = "testing-support"))]
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: DateTime<Utc>,
    started: tokio::time::Instant,
}

#[cfg(any(test, feature = "testing-support"))]
impl TokioClock {
    pub fn starting_at(origin: DateTime<Utc>) -> Self {
        Self {
            origin,
            started: tokio::time::Instant::now(),
        }
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::TimeDelta::from_std(self.started.elapsed())
            .unwrap_or(chrono::TimeDelta::zero());
        self.origin + elapsed
    }
}
