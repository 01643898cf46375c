// src/pad/sync_pad/protocol_helpers.rs

use super::SyncPad;
use crate::common::{
    command::Command,
    error::PadError,
    hal_traits::{PadSerial, PadTimer},
    types::Mode,
};
use crate::groups::ThresholdReading;

impl<IF> SyncPad<IF>
where
    IF: PadSerial + PadTimer,
{
    /// Last mode this handle put the pad in, `None` if unknown.
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn is_mode_locked(&self) -> bool {
        self.mode_locked
    }

    /// Switches the pad to `target`.
    ///
    /// Pending input is dispatched first. Does nothing more when the pad is
    /// already there or the mode is locked. Otherwise the
    /// pad is always taken out of its current mode with `X` first, then put in
    /// `target` with `MOD<n>`. A missing acknowledgement is only logged.
    pub fn set_mode(&mut self, target: Mode) -> Result<(), PadError<IF::Error>> {
        self.dispatch_messages()?;
        if self.mode_locked {
            log::trace!("mode locked at {:?}, ignoring switch to {}", self.mode, target);
            return Ok(());
        }
        if self.mode == Some(target) {
            return Ok(());
        }

        self.send_message(&Command::ExitMode)?;
        self.await_ack(&Command::ExitMode)?;

        if target != Mode::Settings {
            let select = Command::SelectMode(target);
            self.send_message(&select)?;
            self.await_ack(&select)?;
        }

        log::debug!("pad mode {:?} -> {}", self.mode, target);
        self.mode = Some(target);
        Ok(())
    }

    fn await_ack(&mut self, command: &Command) -> Result<(), PadError<IF::Error>> {
        if let Some(ack) = self.await_response(self.config.ack_timeout)? {
            log::trace!("'{}' acknowledged with {:?}", command, ack);
        } else {
            log::warn!("no acknowledgement for '{}'", command);
        }
        Ok(())
    }

    /// Current mode, asking the pad with `Z` when it is not tracked.
    ///
    /// An unparseable or missing reply is logged and reported as `None`.
    pub fn get_mode(&mut self) -> Result<Option<Mode>, PadError<IF::Error>> {
        if let Some(mode) = self.mode {
            return Ok(Some(mode));
        }

        let Some(reply) = self.request(&Command::QueryMode, self.config.query_timeout)? else {
            return Ok(None);
        };
        let digits = reply.trim().trim_start_matches(|c: char| !c.is_ascii_digit());
        match digits.parse::<u8>().ok().map(Mode::try_from) {
            Some(Ok(mode)) => {
                self.mode = Some(mode);
                Ok(Some(mode))
            }
            _ => {
                log::warn!("could not read a mode from reply {:?}", reply);
                Ok(None)
            }
        }
    }

    /// Freezes the mode: [`set_mode`](Self::set_mode) becomes a no-op until unlocked.
    pub fn lock_mode(&mut self) -> Option<Mode> {
        self.mode_locked = true;
        self.mode
    }

    pub fn unlock_mode(&mut self) -> Option<Mode> {
        self.mode_locked = false;
        self.mode
    }

    /// Zeroes the device clock and records the matching host instant.
    ///
    /// While streaming the lightweight `R` is enough. Otherwise the pad is
    /// taken to settings for a full `REST`. Either way it ends up streaming.
    pub fn reset_timer(&mut self) -> Result<(), PadError<IF::Error>> {
        if self.mode == Some(Mode::Streaming) {
            self.send_message(&Command::QuickResetTimer)?;
        } else {
            self.set_mode(Mode::Settings)?;
            self.send_message(&Command::ResetTimer)?;
        }
        self.timer_reference = Some(self.interface.now());
        self.pause();
        self.set_mode(Mode::Streaming)?;
        log::debug!("device clock reset");
        Ok(())
    }

    /// Kicks the pad out of whatever mode it is in and throws away pending input.
    pub(super) fn wake(&mut self) -> Result<(), PadError<IF::Error>> {
        self.send_unchecked(&Command::ExitMode)?;
        self.pause();

        for _ in 0..self.config.max_drain_attempts.max(1) {
            let discarded = self.read_available()?;
            if discarded.is_empty() {
                break;
            }
            log::trace!("discarded {} bytes on wake", discarded.len());
        }
        self.assembler.clear();
        self.mode = Some(Mode::Settings);
        Ok(())
    }

    /// Liveness probe: asks for the firmware version.
    ///
    /// Only this probe's reply counts. The firmware string of the last
    /// answered probe stays available through [`firmware`](Self::firmware).
    pub fn is_awake(&mut self) -> Result<bool, PadError<IF::Error>> {
        self.set_mode(Mode::Settings)?;
        let reply = self.request(&Command::Firmware, self.config.query_timeout)?;
        self.set_mode(Mode::Streaming)?;
        let awake = reply.is_some();
        if awake {
            self.firmware = reply;
        }
        Ok(awake)
    }

    /// Usage text from the pad, first line only.
    pub fn help(&mut self) -> Result<Option<String>, PadError<IF::Error>> {
        self.set_mode(Mode::Settings)?;
        let reply = self.request(&Command::Help, self.config.query_timeout)?;
        self.set_mode(Mode::Streaming)?;
        Ok(reply)
    }

    /// Sends one threshold command and reads back which side of the threshold
    /// the sensor is on. A silent pad yields [`ThresholdReading::Unknown`].
    pub fn threshold_round_trip(&mut self, command: &Command) -> Result<ThresholdReading, PadError<IF::Error>> {
        self.set_mode(Mode::Settings)?;
        self.send_message(command)?;
        self.delay(self.config.threshold_settle);

        let reply = self.await_response(self.config.calibration_timeout)?;
        let reading = ThresholdReading::from_reply(reply.as_deref());
        if reading == ThresholdReading::Unknown {
            log::warn!("ambiguous answer {:?} to '{}'", reply, command);
        }

        self.set_mode(Mode::Streaming)?;
        Ok(reading)
    }
}
