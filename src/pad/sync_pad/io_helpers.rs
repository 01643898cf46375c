// src/pad/sync_pad/io_helpers.rs

use super::SyncPad;
use crate::common::{
    error::PadError,
    hal_traits::{PadSerial, PadTimer},
    timing,
};
use nb::Result as NbResult;
use std::time::Duration;

impl<IF> SyncPad<IF>
where
    IF: PadSerial + PadTimer,
{
    /// Executes a non-blocking I/O operation (`f`) repeatedly until it
    /// stops returning `WouldBlock`, returning the final result or a timeout error.
    pub(super) fn execute_blocking_io_with_timeout<FN, T>(
        &mut self,
        timeout: Duration,
        mut f: FN,
    ) -> Result<T, PadError<IF::Error>>
    where
        FN: FnMut(&mut IF) -> NbResult<T, IF::Error>,
    {
        let deadline = self.interface.now() + timeout;

        loop {
            match f(&mut self.interface) {
                Ok(result) => return Ok(result),
                Err(nb::Error::WouldBlock) => {
                    if self.interface.now() >= deadline {
                        return Err(PadError::Timeout);
                    }
                    self.interface.delay_us(100);
                }
                Err(nb::Error::Other(e)) => return Err(PadError::Io(e)),
            }
        }
    }

    /// Writes already formatted command bytes and flushes.
    pub(super) fn send_command_bytes(&mut self, cmd_bytes: &[u8]) -> Result<(), PadError<IF::Error>> {
        for byte in cmd_bytes {
            self.execute_blocking_io_with_timeout(timing::WRITE_BYTE_TIMEOUT, |iface| {
                iface.write_byte(*byte)
            })?;
        }
        self.execute_blocking_io_with_timeout(timing::FLUSH_TIMEOUT, |iface| iface.flush())
    }

    /// Reads whatever is waiting, without blocking, up to one chunk.
    pub(super) fn read_available(&mut self) -> Result<Vec<u8>, PadError<IF::Error>> {
        let mut data = Vec::new();
        while data.len() < timing::MAX_READ_CHUNK {
            match self.interface.read_byte() {
                Ok(byte) => data.push(byte),
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => return Err(PadError::Io(e)),
            }
        }
        Ok(data)
    }

    pub(super) fn delay(&mut self, duration: Duration) {
        let us = u32::try_from(duration.as_micros()).unwrap_or(u32::MAX);
        self.interface.delay_us(us);
    }

    /// Inter-command pause.
    pub fn pause(&mut self) {
        self.delay(self.config.pause);
    }
}
