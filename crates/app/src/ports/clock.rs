//! Clock port: the local time of day seen by time windows.

use std::sync::{Mutex, PoisonError};

use chrono::NaiveTime;

pub trait Clock: Send + Sync {
    fn time_of_day(&self) -> NaiveTime;
}

/// Wall-clock local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn time_of_day(&self) -> NaiveTime {
        chrono::Local::now().time()
    }
}

/// A clock that reads whatever it was last set to.
#[derive(Debug)]
pub struct FixedClock {
    time: Mutex<NaiveTime>,
}

impl FixedClock {
    #[must_use]
    pub fn new(time: NaiveTime) -> Self {
        Self {
            time: Mutex::new(time),
        }
    }

    /// Shorthand for `new` at `hour:minute`; out-of-range values read as midnight.
    #[must_use]
    pub fn at(hour: u32, minute: u32) -> Self {
        Self::new(NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN))
    }

    pub fn set(&self, time: NaiveTime) {
        *self.time.lock().unwrap_or_else(PoisonError::into_inner) = time;
    }
}

impl Clock for FixedClock {
    fn time_of_day(&self) -> NaiveTime {
        *self.time.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
