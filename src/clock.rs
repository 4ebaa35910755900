//! Time source for window filtering.
//!
//! The daily series is relative to "now". Production code reads the wall clock
//! on every call; tests pin it with [`FixedClock`].

use chrono::{DateTime, Utc};

/// Source of the current time
pub trait Clock {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time, re-evaluated on every call
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that always reports the same instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
