//! Host monotonic clock

use crate::common::{PadInstant, PadTimer};
use std::ops::{Add, Sub};
use std::time::{Duration, Instant};

/// Instant on a [`HostClock`], stored as the offset from the clock's origin.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostInstant(Duration);

impl Add<Duration> for HostInstant {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self {
        HostInstant(self.0.saturating_add(rhs))
    }
}

impl Sub<HostInstant> for HostInstant {
    type Output = Duration;
    fn sub(self, rhs: HostInstant) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

impl PadInstant for HostInstant {
    fn since_origin(&self) -> Duration {
        self.0
    }
}

/// Monotonic clock backed by [`std::time::Instant`].
///
/// Clones share the same origin, so timestamps from every pad opened with a
/// cloned clock are directly comparable.
#[derive(Debug, Copy, Clone)]
pub struct HostClock {
    origin: Instant,
}

impl HostClock {
    pub fn new() -> Self {
        HostClock {
            origin: Instant::now(),
        }
    }

    pub fn with_origin(origin: Instant) -> Self {
        HostClock { origin }
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PadTimer for HostClock {
    type Instant = HostInstant;

    fn now(&self) -> HostInstant {
        HostInstant(self.origin.elapsed())
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(u64::from(us)));
    }
}
