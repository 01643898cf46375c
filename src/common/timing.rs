// src/common/timing.rs

use std::time::Duration;

// The pad is a USB CDC device; these are the host-side waits that keep the
// command/response exchange in step with its firmware.

/// Default pause between commands (one 240 Hz frame).
pub const PAUSE_DURATION: Duration = Duration::from_micros(4167);

/// How long to wait for the reply to a mode change (`X`, `MOD<n>`).
pub const ACK_TIMEOUT: Duration = Duration::from_millis(50);

/// How long to wait for a reply to a query (`FIRM`, `Z`, `HELP`).
pub const QUERY_TIMEOUT: Duration = Duration::from_millis(250);

/// How long to wait for the `0`/`1` answer to a threshold command.
pub const CALIBRATION_TIMEOUT: Duration = Duration::from_millis(250);

/// Extra settle time after a threshold change before the answer is read.
pub const THRESHOLD_SETTLE: Duration = Duration::from_millis(20);

/// How long a stimulus may take to show up as an event.
pub const STIMULUS_TIMEOUT: Duration = Duration::from_secs(1);

/// Budget for writing one byte before the transport is declared stuck.
pub const WRITE_BYTE_TIMEOUT: Duration = Duration::from_millis(20);

/// Budget for flushing a command.
pub const FLUSH_TIMEOUT: Duration = Duration::from_millis(20);

/// Poll interval while waiting on the transport.
pub const POLL_INTERVAL: Duration = Duration::from_micros(500);

/// Most bytes pulled from the transport in a single dispatch pass.
pub const MAX_READ_CHUNK: usize = 4096;

/// How many dispatch passes to spend draining input before sending a command.
pub const MAX_DRAIN_ATTEMPTS: usize = 10;
