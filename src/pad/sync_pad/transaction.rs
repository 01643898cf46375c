// src/pad/sync_pad/transaction.rs

use super::SyncPad;
use crate::common::{
    command::Command,
    error::PadError,
    hal_traits::{PadSerial, PadTimer},
    timing,
};
use std::time::Duration;

impl<IF> SyncPad<IF>
where
    IF: PadSerial + PadTimer,
{
    /// Sends one command line.
    ///
    /// Pending input is dispatched first so that event lines already on the
    /// wire are not mistaken for the reply to this command.
    pub fn send_message(&mut self, command: &Command) -> Result<(), PadError<IF::Error>> {
        self.drain_input()?;
        self.send_unchecked(command)
    }

    /// Sends without draining. Only the wake-up probe uses this, when the input
    /// may hold arbitrary noise.
    pub(super) fn send_unchecked(&mut self, command: &Command) -> Result<(), PadError<IF::Error>> {
        let buffer = command.format_into(&self.config.eol)?;
        log::trace!("-> {}", command);
        self.send_command_bytes(buffer.as_bytes())
    }

    /// Waits up to `timeout` for the next non-event line.
    ///
    /// Events that arrive meanwhile are routed as usual. `Ok(None)` means the
    /// device stayed silent, which callers treat as a warning, not a failure.
    pub fn await_response(&mut self, timeout: Duration) -> Result<Option<String>, PadError<IF::Error>> {
        let deadline = self.interface.now() + timeout;
        loop {
            let mut replies = self.pump()?.replies.into_iter();
            if let Some(reply) = replies.next() {
                for extra in replies {
                    log::debug!("ignoring extra reply line {:?}", extra);
                }
                log::trace!("<- {}", reply);
                return Ok(Some(reply));
            }
            if self.interface.now() >= deadline {
                return Ok(None);
            }
            self.delay(timing::POLL_INTERVAL);
        }
    }

    /// Sends `command` and waits for its reply line.
    pub fn request(
        &mut self,
        command: &Command,
        timeout: Duration,
    ) -> Result<Option<String>, PadError<IF::Error>> {
        self.send_message(command)?;
        let reply = self.await_response(timeout)?;
        if reply.is_none() && command.expects_reply() {
            log::warn!("no reply to '{}' within {:?}", command, timeout);
        }
        Ok(reply)
    }

    /// Dispatches pending input until the line is quiet, bounded by
    /// `max_drain_attempts`. An unterminated line left at the end is dropped.
    pub(super) fn drain_input(&mut self) -> Result<(), PadError<IF::Error>> {
        for _ in 0..self.config.max_drain_attempts.max(1) {
            let pumped = self.pump()?;
            for line in &pumped.replies {
                log::warn!("discarding unexpected line {:?} before sending a command", line);
            }
            if pumped.bytes == 0 {
                if !self.assembler.has_partial() {
                    return Ok(());
                }
                self.pause();
            }
        }

        if self.assembler.has_partial() {
            log::warn!(
                "dropping unterminated input {:?} before sending a command",
                String::from_utf8_lossy(self.assembler.partial())
            );
            self.assembler.clear();
        }
        Ok(())
    }
}
