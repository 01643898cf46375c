//! Serial transport implementation

use super::clock::{HostClock, HostInstant};
use crate::common::{FrameFormat, PadSerial, PadTimer, Parity};
use serialport::{DataBits, FlowControl, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::time::Duration;

/// A pad reached through a host serial port.
pub struct SerialInterface {
    port: Box<dyn SerialPort>,
    name: String,
    clock: HostClock,
}

impl SerialInterface {
    /// Open a serial port
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "COM6" or "/dev/ttyACM0")
    /// * `frame` - Line settings; the pad uses 115200 8N1
    pub fn open(path: &str, frame: &FrameFormat) -> Result<Self, serialport::Error> {
        Self::open_with_clock(path, frame, HostClock::new())
    }

    /// Open a serial port timestamping against an existing clock, so several
    /// pads report in one time base.
    pub fn open_with_clock(
        path: &str,
        frame: &FrameFormat,
        clock: HostClock,
    ) -> Result<Self, serialport::Error> {
        let port = serialport::new(path, frame.baud_rate)
            .data_bits(data_bits(frame.data_bits))
            .parity(parity(frame.parity))
            .stop_bits(stop_bits(frame.stop_bits))
            .flow_control(FlowControl::None)
            // reads only happen once bytes_to_read() reports data
            .timeout(Duration::from_millis(1))
            .open()?;

        log::info!("Opened serial port: {} at {} baud", path, frame.baud_rate);

        Ok(SerialInterface {
            port,
            name: path.to_string(),
            clock,
        })
    }
}

fn data_bits(bits: u8) -> DataBits {
    match bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        _ => DataBits::Eight,
    }
}

fn parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Even => serialport::Parity::Even,
        Parity::Odd => serialport::Parity::Odd,
    }
}

fn stop_bits(bits: u8) -> StopBits {
    if bits == 2 {
        StopBits::Two
    } else {
        StopBits::One
    }
}

fn would_block(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

impl PadSerial for SerialInterface {
    type Error = io::Error;

    fn read_byte(&mut self) -> nb::Result<u8, io::Error> {
        match self.port.bytes_to_read() {
            Ok(0) => return Err(nb::Error::WouldBlock),
            Ok(_) => {}
            Err(e) => return Err(nb::Error::Other(e.into())),
        }
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => Ok(byte[0]),
            Ok(_) => Err(nb::Error::WouldBlock),
            Err(e) if would_block(&e) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn write_byte(&mut self, byte: u8) -> nb::Result<(), io::Error> {
        match self.port.write(&[byte]) {
            Ok(1) => Ok(()),
            Ok(_) => Err(nb::Error::WouldBlock),
            Err(e) if would_block(&e) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn flush(&mut self) -> nb::Result<(), io::Error> {
        match self.port.flush() {
            Ok(()) => Ok(()),
            Err(e) if would_block(&e) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn port_name(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

impl PadTimer for SerialInterface {
    type Instant = HostInstant;

    fn now(&self) -> HostInstant {
        self.clock.now()
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.delay_us(us);
    }
}
