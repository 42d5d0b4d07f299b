use std::{
    fmt::Debug,
    sync::{Mutex, PoisonError},
};

use chrono::{DateTime, TimeDelta, TimeZone, Timelike, Utc};

/// Source of wall-clock time. Injected so cache expiry and "leave now" can be tested.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drop minutes, seconds and sub-seconds, keeping the hour in the value's own offset.
pub fn truncate_to_hour<Tz: TimeZone>(dt: DateTime<Tz>) -> DateTime<Tz> {
    let past_hour = TimeDelta::minutes(i64::from(dt.minute()))
        + TimeDelta::seconds(i64::from(dt.second()))
        + TimeDelta::nanoseconds(i64::from(dt.nanosecond()));
    dt - past_hour
}
