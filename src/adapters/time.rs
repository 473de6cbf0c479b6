//! Wall-clock adapter.

use chrono::{DateTime, Utc};

use crate::app::ports::TimePort;

/// [`TimePort`] backed by the host system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimePort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// [`TimePort`] frozen at one instant, for replaying a given moment.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl TimePort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
