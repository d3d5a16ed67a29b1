//! Wall-clock source for staleness checks and the zulu display.
//!
//! The reconciler never reads system time directly; it asks an injected
//! [`Clock`], so tests can pin "now".

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Timelike, Utc};

use crate::timecode::ClockTime;

/// A source of the current UTC time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current instant.
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

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Create a clock pinned at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Pin the clock at a new instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = now;
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Time of day of an instant.
#[must_use]
pub fn time_of_day(now: DateTime<Utc>) -> ClockTime {
    // hour() < 24 and minute() < 60 always hold
    let hour = u16::try_from(now.hour()).unwrap_or(0);
    let minute = u16::try_from(now.minute()).unwrap_or(0);
    ClockTime::from_hm(hour, minute).unwrap_or(ClockTime::MIDNIGHT)
}

/// The `HHMMZ` string shown in the board header.
#[must_use]
pub fn zulu(now: DateTime<Utc>) -> String {
    format!("{}Z", time_of_day(now))
}
