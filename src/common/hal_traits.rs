// src/common/hal_traits.rs

use std::fmt::Debug;
use std::ops::{Add, Sub};
use std::time::Duration;

/// A point on the host's monotonic clock.
///
/// Response timestamps are reported in this clock's domain, as seconds since
/// its origin.
pub trait PadInstant:
    Copy + Ord + Add<Duration, Output = Self> + Sub<Self, Output = Duration>
{
    /// Time elapsed between the clock origin and this instant.
    fn since_origin(&self) -> Duration;

    #[inline]
    fn as_secs_f64(&self) -> f64 {
        self.since_origin().as_secs_f64()
    }
}

/// Clock and delay operations needed by the pad engine.
pub trait PadTimer {
    type Instant: PadInstant;

    /// Current time on the host's monotonic clock.
    fn now(&self) -> Self::Instant;

    /// Delay for at least the specified number of microseconds.
    fn delay_us(&mut self, us: u32);

    /// Delay for at least the specified number of milliseconds.
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }
}

/// Non-blocking serial byte I/O to the pad.
pub trait PadSerial {
    /// Associated error type for communication errors.
    type Error: Debug;

    /// Attempts to read a single byte.
    ///
    /// Returns `Err(nb::Error::WouldBlock)` when no byte is waiting. Must never
    /// block waiting for input, the dispatch loop relies on that.
    fn read_byte(&mut self) -> nb::Result<u8, Self::Error>;

    /// Attempts to write a single byte.
    ///
    /// Returns `Err(nb::Error::WouldBlock)` if the transmit buffer is full.
    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error>;

    /// Attempts to flush the transmit buffer.
    fn flush(&mut self) -> nb::Result<(), Self::Error>;

    /// Name of the port this interface is bound to, e.g. `COM6`.
    fn port_name(&self) -> Option<String> {
        None
    }
}
