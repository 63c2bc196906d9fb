//! Wall clock access for the clock animation

use std::time::Duration;

use chrono::{Local, Timelike};
use pilight_core::text::TimeOfDay;

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Source of local time
pub trait WallClock: Send + Sync + 'static {
    /// Current local time of day
    fn now(&self) -> TimeOfDay;

    /// Time left until the next whole second
    fn until_next_second(&self) -> Duration;
}

/// Host local time via `chrono`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> TimeOfDay {
        let now = Local::now();
        // chrono guarantees hour < 24 and minute < 60
        TimeOfDay::new(now.hour() as u8, now.minute() as u8)
    }

    fn until_next_second(&self) -> Duration {
        // Leap seconds report nanos past one second
        let nanos = Local::now().nanosecond() % NANOS_PER_SECOND;
        Duration::from_nanos(u64::from(NANOS_PER_SECOND - nanos))
    }
}
