// src/pad/sync_pad/mod.rs

use crate::common::{
    error::PadError,
    frame::FrameAssembler,
    hal_traits::{PadSerial, PadTimer},
    types::Mode,
    PadConfig,
};
use crate::groups::GroupNode;
use crate::registry::canonical_port;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Weak;
use std::time::Duration;

mod dispatch;
mod io_helpers;
mod protocol_helpers;
mod transaction;

/// One physical connection to a TPad, driven synchronously.
///
/// Owns the transport and every piece of device-level state: the tracked
/// mode, the mode lock, the clock reference and the partial-line buffer.
/// Sensor groups attach to it and are fed from [`dispatch_messages`](Self::dispatch_messages);
/// the pad only keeps weak references to them.
pub struct SyncPad<IF>
where
    IF: PadSerial + PadTimer,
{
    interface: IF,
    config: PadConfig,
    port: Option<String>,
    mode: Option<Mode>,
    mode_locked: bool,
    timer_reference: Option<IF::Instant>,
    messages: BTreeMap<Duration, Vec<String>>,
    assembler: FrameAssembler,
    nodes: Vec<Weak<RefCell<GroupNode>>>,
    firmware: Option<String>,
}

impl<IF> SyncPad<IF>
where
    IF: PadSerial + PadTimer,
{
    /// Wraps an open transport without talking to the device.
    ///
    /// The mode is unknown and the clock unsynchronised until
    /// [`reset_timer`](Self::reset_timer) runs; [`connect`](Self::connect)
    /// does both.
    pub fn new(interface: IF, config: PadConfig) -> Self {
        let port = config
            .port
            .clone()
            .or_else(|| interface.port_name())
            .map(|p| canonical_port(&p));
        SyncPad {
            interface,
            config,
            port,
            mode: None,
            mode_locked: false,
            timer_reference: None,
            messages: BTreeMap::new(),
            assembler: FrameAssembler::new(),
            nodes: Vec::new(),
            firmware: None,
        }
    }

    /// Wakes the pad, checks it answers (if configured), and synchronises the clock.
    ///
    /// Fails eagerly: a silent device is a connection error here, not later.
    pub fn connect(interface: IF, config: PadConfig) -> Result<Self, PadError<IF::Error>> {
        let mut pad = Self::new(interface, config);
        pad.wake()?;

        if pad.config.check_awake && !pad.is_awake()? {
            log::error!(
                "TPad on {} did not answer the firmware probe",
                pad.port.as_deref().unwrap_or("<unknown port>")
            );
            return Err(PadError::Connection {
                requested: pad.port.clone(),
                available: Vec::new(),
            });
        }

        pad.reset_timer()?;
        log::info!(
            "Connected to TPad on {} (firmware: {})",
            pad.port.as_deref().unwrap_or("<unknown port>"),
            pad.firmware.as_deref().unwrap_or("unknown")
        );
        Ok(pad)
    }

    /// Canonical port name, if known.
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    pub fn config(&self) -> &PadConfig {
        &self.config
    }

    /// Firmware string reported by the last liveness probe.
    pub fn firmware(&self) -> Option<&str> {
        self.firmware.as_deref()
    }

    pub fn interface(&self) -> &IF {
        &self.interface
    }

    pub fn interface_mut(&mut self) -> &mut IF {
        &mut self.interface
    }

    /// Consumes the pad, returning the transport.
    pub fn into_interface(self) -> IF {
        self.interface
    }
}
