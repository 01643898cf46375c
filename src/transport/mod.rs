//! Transport implementations of [`PadSerial`](crate::common::PadSerial) and
//! [`PadTimer`](crate::common::PadTimer).
//!
//! ## Features
//!
//! - `serialport`: [`SerialInterface`], a host serial port bound through the
//!   `serialport` crate.

mod clock;
pub mod mock;
#[cfg(feature = "serialport")]
mod serial;

pub use clock::{HostClock, HostInstant};
pub use mock::{MockInstant, MockInterface};
#[cfg(feature = "serialport")]
pub use serial::SerialInterface;
