// src/groups/response.rs

use std::cell::RefCell;
use std::rc::Rc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An event as seen by a sensor group.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TypedResponse {
    /// Seconds on the host clock.
    pub time: f64,
    /// Zero-based channel within the group.
    pub channel: usize,
    /// `true` on press/onset, `false` on release/offset.
    pub value: bool,
    /// Threshold in force on that channel when the event was routed. Always
    /// `None` for buttons.
    pub threshold: Option<u8>,
}

/// Answer of the pad to a threshold command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ThresholdReading {
    /// The sensor signal is below the new threshold (`0`).
    Below,
    /// The sensor signal is above the new threshold (`1`).
    Above,
    /// No reply, or a reply other than `0`/`1`.
    Unknown,
}

impl ThresholdReading {
    pub fn from_reply(reply: Option<&str>) -> Self {
        match reply.map(str::trim) {
            Some("0") => ThresholdReading::Below,
            Some("1") => ThresholdReading::Above,
            _ => ThresholdReading::Unknown,
        }
    }

    pub fn is_above(&self) -> Option<bool> {
        match self {
            ThresholdReading::Below => Some(false),
            ThresholdReading::Above => Some(true),
            ThresholdReading::Unknown => None,
        }
    }
}

/// Receives the typed responses of the groups it is attached to.
///
/// Called synchronously from within message dispatch. Calls back into the same
/// pad are refused (`Busy`) or, for dispatch, ignored.
pub trait Listener {
    fn receive_message(&mut self, response: &TypedResponse);
}

impl<F> Listener for F
where
    F: FnMut(&TypedResponse),
{
    fn receive_message(&mut self, response: &TypedResponse) {
        self(response)
    }
}

pub type SharedListener = Rc<RefCell<dyn Listener>>;

/// Logs every response at info level.
#[derive(Debug, Clone, Default)]
pub struct LoggingListener {
    label: String,
    received: usize,
}

impl LoggingListener {
    pub fn new(label: impl Into<String>) -> Self {
        LoggingListener {
            label: label.into(),
            received: 0,
        }
    }

    pub fn received(&self) -> usize {
        self.received
    }
}

impl Listener for LoggingListener {
    fn receive_message(&mut self, response: &TypedResponse) {
        self.received += 1;
        log::info!(
            "[{}] t={:.4} channel={} value={} threshold={:?}",
            self.label,
            response.time,
            response.channel,
            response.value,
            response.threshold
        );
    }
}
