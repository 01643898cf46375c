// src/groups/calibration.rs

use super::{SensorGroup, ThresholdReading};
use crate::common::{Mode, PadError, PadSerial, PadTimer};
use std::rc::Rc;

/// Attempts per bisection step before a step is given up as unreadable.
const READ_ATTEMPTS: usize = 2;

impl<IF> SensorGroup<IF>
where
    IF: PadSerial + PadTimer,
{
    /// Sets the threshold of each zero-based channel in `channels` to `level`.
    ///
    /// For every channel the pad is taken to settings, sent `AAO`/`AAVK`, and
    /// returned to streaming. The returned readings say on which side of the new
    /// threshold each sensor currently is. The threshold is recorded even when the
    /// pad does not answer.
    pub fn set_threshold(
        &self,
        level: u8,
        channels: &[usize],
    ) -> Result<Vec<ThresholdReading>, PadError<IF::Error>> {
        let kind = self.kind();
        if !kind.supports_threshold() {
            return Err(PadError::ThresholdUnsupported(kind));
        }
        let count = self.channels();

        let mut readings = Vec::with_capacity(channels.len());
        for &channel in channels {
            let command = Some(channel)
                .filter(|&channel| channel < count)
                .and_then(|channel| u8::try_from(channel + 1).ok())
                .and_then(|number| kind.threshold_command(number, level))
                .ok_or(PadError::ChannelOutOfRange { channel, count })?;

            let reading = self.pad.with(|pad| pad.threshold_round_trip(&command))?;
            self.node.borrow_mut().store_threshold(channel, level);
            log::debug!("{} channel {} threshold {} -> {:?}", kind, channel, level, reading);
            readings.push(reading);
        }
        Ok(readings)
    }

    /// Sets the threshold of every channel in the group.
    pub fn set_threshold_all(&self, level: u8) -> Result<Vec<ThresholdReading>, PadError<IF::Error>> {
        let channels: Vec<usize> = (0..self.channels()).collect();
        self.set_threshold(level, &channels)
    }

    /// Finds a threshold separating the resting and stimulated signal on
    /// `channel` and applies it.
    ///
    /// `stimulus(false)` must remove the stimulus, `stimulus(true)` present it.
    /// For each state the signal level is located by bisection over the
    /// threshold range, with the mode locked in settings throughout. Returns the
    /// midpoint, or `None` if the two states cannot be told apart.
    pub fn find_threshold<F>(&self, channel: usize, mut stimulus: F) -> Result<Option<u8>, PadError<IF::Error>>
    where
        F: FnMut(bool),
    {
        let kind = self.kind();
        if !kind.supports_threshold() {
            return Err(PadError::ThresholdUnsupported(kind));
        }
        let count = self.channels();
        if channel >= count {
            return Err(PadError::ChannelOutOfRange { channel, count });
        }

        self.pad.set_mode(Mode::Settings)?;
        let result = {
            let _lock = self.pad.mode_lock()?;
            self.calibrate_locked(channel, &mut stimulus)
        };
        self.pad.set_mode(Mode::Streaming)?;
        result
    }

    /// Finds which channel of this group responds to a stimulus.
    ///
    /// The pad is put in streaming mode and pending input is flushed. Then
    /// `stimulus(true)` presents the stimulus, and events are dispatched until
    /// one of this group's channels reports on or `stimulus_timeout` passes.
    /// `stimulus(false)` removes it again. Returns the zero-based channel, or
    /// `None` if nothing responded.
    pub fn find_channel<F>(&self, mut stimulus: F) -> Result<Option<usize>, PadError<IF::Error>>
    where
        F: FnMut(bool),
    {
        self.pad.set_mode(Mode::Streaming)?;
        self.pad.pause()?;
        self.pad.dispatch_messages()?;
        let timeout = self.pad.config()?.stimulus_timeout;
        let start = self.node.borrow().responses().len();
        let count = self.channels();

        let node = Rc::clone(&self.node);
        let first_on = move || {
            node.borrow()
                .responses()
                .iter()
                .skip(start)
                .find(|r| r.value && r.channel < count)
                .map(|r| r.channel)
        };

        stimulus(true);
        let waited = self.pad.dispatch_until(timeout, || first_on().is_some());
        stimulus(false);
        waited?;

        let channel = first_on();
        match channel {
            Some(channel) => log::info!("{} responded on channel {}", self.kind(), channel),
            None => log::warn!("no {} responded within {:?}", self.kind(), timeout),
        }
        Ok(channel)
    }

    fn calibrate_locked<F>(&self, channel: usize, stimulus: &mut F) -> Result<Option<u8>, PadError<IF::Error>>
    where
        F: FnMut(bool),
    {
        stimulus(false);
        let Some(resting) = self.signal_level(channel)? else {
            log::warn!("{} channel {}: resting level unreadable", self.kind(), channel);
            return Ok(None);
        };
        stimulus(true);
        let Some(stimulated) = self.signal_level(channel)? else {
            log::warn!("{} channel {}: stimulated level unreadable", self.kind(), channel);
            return Ok(None);
        };

        if stimulated <= resting {
            log::warn!(
                "{} channel {}: stimulus does not raise the signal ({} -> {})",
                self.kind(),
                channel,
                resting,
                stimulated
            );
            return Ok(None);
        }

        let threshold = resting + (stimulated - resting) / 2;
        self.set_threshold(threshold, &[channel])?;
        log::info!(
            "{} channel {} calibrated: resting {}, stimulated {}, threshold {}",
            self.kind(),
            channel,
            resting,
            stimulated,
            threshold
        );
        Ok(Some(threshold))
    }

    /// Highest threshold the current signal still reads above. `Some(0)` also
    /// covers a signal below every threshold.
    fn signal_level(&self, channel: usize) -> Result<Option<u8>, PadError<IF::Error>> {
        let (mut low, mut high) = (0u8, u8::MAX);
        while low < high {
            let mid = low + (high - low).div_ceil(2);
            match self.read_side(channel, mid)? {
                Some(true) => low = mid,
                Some(false) => high = mid - 1,
                None => return Ok(None),
            }
        }
        Ok(Some(low))
    }

    fn read_side(&self, channel: usize, level: u8) -> Result<Option<bool>, PadError<IF::Error>> {
        for _ in 0..READ_ATTEMPTS {
            let readings = self.set_threshold(level, &[channel])?;
            if let Some(above) = readings.first().and_then(ThresholdReading::is_above) {
                return Ok(Some(above));
            }
        }
        Ok(None)
    }
}
