//! Connection settings for a pad.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::timing;

/// Serial parity setting.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

/// Serial line framing. The pad runs 115200 8N1.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameFormat {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
}

impl Default for FrameFormat {
    fn default() -> Self {
        FrameFormat {
            baud_rate: 115_200,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
        }
    }
}

/// Everything needed to open and drive one pad.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PadConfig {
    /// Serial port, e.g. `COM6` or `/dev/ttyACM0`. `None` picks the first discovered pad.
    pub port: Option<String>,
    pub frame: FrameFormat,
    /// Line ending appended to every command.
    pub eol: String,
    /// Pause between consecutive commands.
    pub pause: Duration,
    /// Wait for mode change acknowledgements.
    pub ack_timeout: Duration,
    /// Wait for replies to queries.
    pub query_timeout: Duration,
    /// Wait for threshold answers.
    pub calibration_timeout: Duration,
    /// Settle time after setting a threshold.
    pub threshold_settle: Duration,
    /// How long to wait for a sensor to respond to a stimulus.
    pub stimulus_timeout: Duration,
    /// Dispatch passes spent draining input before a command is sent.
    pub max_drain_attempts: usize,
    /// Most timestamps kept in the raw message log, oldest dropped first.
    /// `None` keeps everything until the log is cleared.
    pub message_log_limit: Option<usize>,
    /// Probe the pad with `FIRM` on connect and fail if it stays silent.
    pub check_awake: bool,
}

impl Default for PadConfig {
    fn default() -> Self {
        PadConfig {
            port: None,
            frame: FrameFormat::default(),
            eol: "\n".to_string(),
            pause: timing::PAUSE_DURATION,
            ack_timeout: timing::ACK_TIMEOUT,
            query_timeout: timing::QUERY_TIMEOUT,
            calibration_timeout: timing::CALIBRATION_TIMEOUT,
            threshold_settle: timing::THRESHOLD_SETTLE,
            stimulus_timeout: timing::STIMULUS_TIMEOUT,
            max_drain_attempts: timing::MAX_DRAIN_ATTEMPTS,
            message_log_limit: None,
            check_awake: true,
        }
    }
}

impl PadConfig {
    pub fn new(port: impl Into<String>) -> Self {
        PadConfig {
            port: Some(port.into()),
            ..Self::default()
        }
    }

    pub fn with_eol(mut self, eol: impl Into<String>) -> Self {
        self.eol = eol.into();
        self
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    pub fn with_calibration_timeout(mut self, timeout: Duration) -> Self {
        self.calibration_timeout = timeout;
        self
    }

    pub fn with_stimulus_timeout(mut self, timeout: Duration) -> Self {
        self.stimulus_timeout = timeout;
        self
    }

    pub fn with_message_log_limit(mut self, limit: usize) -> Self {
        self.message_log_limit = Some(limit);
        self
    }

    pub fn with_check_awake(mut self, check: bool) -> Self {
        self.check_awake = check;
        self
    }
}
