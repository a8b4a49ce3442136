//! Live clock backed by the system wall clock.

use chrono::{DateTime, Utc};

use crate::ports::Clock;

/// Clock that reads the real current time, the same source file
/// modification times come from.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
