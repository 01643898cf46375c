// src/common/types.rs

use std::convert::TryFrom;
use std::fmt;

// --- Channel class (first field of an event line) ---

/// Which family of inputs an event line comes from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ChannelClass {
    /// `A` - push buttons.
    Buttons,
    /// `C` - opto inputs (photodiodes / light sensors).
    Optos,
    /// `M` - microphone voice key.
    VoiceKey,
    /// `T` - TTL input lines.
    TtlIn,
}

impl ChannelClass {
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'A' => Some(ChannelClass::Buttons),
            b'C' => Some(ChannelClass::Optos),
            b'M' => Some(ChannelClass::VoiceKey),
            b'T' => Some(ChannelClass::TtlIn),
            _ => None,
        }
    }

    pub const fn as_byte(&self) -> u8 {
        match self {
            ChannelClass::Buttons => b'A',
            ChannelClass::Optos => b'C',
            ChannelClass::VoiceKey => b'M',
            ChannelClass::TtlIn => b'T',
        }
    }
}

impl fmt::Display for ChannelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_byte() as char)
    }
}

// --- Transition (second field) ---

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Transition {
    /// `P` - pressed / on.
    Pressed,
    /// `R` - released / off.
    Released,
}

impl Transition {
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'P' => Some(Transition::Pressed),
            b'R' => Some(Transition::Released),
            _ => None,
        }
    }

    pub const fn as_byte(&self) -> u8 {
        match self {
            Transition::Pressed => b'P',
            Transition::Released => b'R',
        }
    }

    #[inline]
    pub const fn is_on(&self) -> bool {
        matches!(self, Transition::Pressed)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_byte() as char)
    }
}

// --- Channel symbol (third field) ---

/// Maps a channel symbol to its 1-based channel number.
///
/// Digits `1`-`9` are buttons 1-9 and `0` is button 10. The bracket symbols
/// are the two opto inputs.
pub const fn channel_number(symbol: u8) -> Option<u8> {
    match symbol {
        b'1'..=b'9' => Some(symbol - b'0'),
        b'0' => Some(10),
        b'[' => Some(1),
        b']' => Some(2),
        _ => None,
    }
}

// --- Device mode ---

/// Device operating mode.
///
/// Only `Settings` and `Streaming` are used by this driver; the device accepts
/// configuration commands in the former and reports events in the latter.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(u8)]
pub enum Mode {
    Settings = 0,
    Reserved1 = 1,
    Reserved2 = 2,
    Streaming = 3,
}

impl Mode {
    #[inline]
    pub const fn as_u8(&self) -> u8 {
        *self as u8
    }
}

/// Error for a mode number the device does not define.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("invalid mode number {0}")]
pub struct InvalidMode(pub u8);

impl TryFrom<u8> for Mode {
    type Error = InvalidMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Settings),
            1 => Ok(Mode::Reserved1),
            2 => Ok(Mode::Reserved2),
            3 => Ok(Mode::Streaming),
            other => Err(InvalidMode(other)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}
