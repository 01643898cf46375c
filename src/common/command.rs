//! Outbound TPad commands.
//!
//! Commands are plain ASCII words, optionally followed by numeric arguments,
//! terminated by the configured end-of-line bytes.

use std::fmt::{self, Write};

use arrayvec::ArrayString;

use super::types::Mode;

/// Capacity of a formatted command including its line ending.
pub const COMMAND_CAPACITY: usize = 24;

/// Fixed-capacity buffer holding one formatted command.
pub type CommandBuffer = ArrayString<COMMAND_CAPACITY>;

/// A command understood by the pad.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    /// `X` - leave the current mode (back to settings).
    ExitMode,
    /// `MOD<n>` - enter mode `n`.
    SelectMode(Mode),
    /// `REST` - full clock reset, settings mode only.
    ResetTimer,
    /// `R` - clock reset that works while streaming.
    QuickResetTimer,
    /// `FIRM` - firmware version probe, used as a liveness check.
    Firmware,
    /// `HELP` - usage text.
    Help,
    /// `Z` - query the current mode.
    QueryMode,
    /// `AAO<n> <level>` - opto threshold on 1-based channel `n`.
    SetOptoThreshold { channel: u8, level: u8 },
    /// `AAVK<n> <level>` - voice key threshold on 1-based channel `n`.
    SetVoiceKeyThreshold { channel: u8, level: u8 },
}

/// Error formatting a command into a [`CommandBuffer`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandFormatError {
    #[error("channel numbers start at 1")]
    ZeroChannel,
    #[error("command does not fit in {COMMAND_CAPACITY} bytes")]
    BufferOverflow,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::ExitMode => f.write_str("X"),
            Command::SelectMode(mode) => write!(f, "MOD{}", mode.as_u8()),
            Command::ResetTimer => f.write_str("REST"),
            Command::QuickResetTimer => f.write_str("R"),
            Command::Firmware => f.write_str("FIRM"),
            Command::Help => f.write_str("HELP"),
            Command::QueryMode => f.write_str("Z"),
            Command::SetOptoThreshold { channel, level } => {
                if *channel == 0 {
                    return Err(fmt::Error);
                }
                write!(f, "AAO{} {}", channel, level)
            }
            Command::SetVoiceKeyThreshold { channel, level } => {
                if *channel == 0 {
                    return Err(fmt::Error);
                }
                write!(f, "AAVK{} {}", channel, level)
            }
        }
    }
}

impl Command {
    /// True if the pad answers this command with a reply line.
    pub fn expects_reply(&self) -> bool {
        match self {
            Command::Firmware | Command::Help | Command::QueryMode => true,
            Command::SetOptoThreshold { .. } | Command::SetVoiceKeyThreshold { .. } => true,
            // Mode changes are acknowledged by some firmware revisions only.
            Command::ExitMode | Command::SelectMode(_) => false,
            Command::ResetTimer | Command::QuickResetTimer => false,
        }
    }

    /// Formats the command followed by `eol` into a fixed-capacity buffer.
    pub fn format_into(&self, eol: &str) -> Result<CommandBuffer, CommandFormatError> {
        match self {
            Command::SetOptoThreshold { channel: 0, .. }
            | Command::SetVoiceKeyThreshold { channel: 0, .. } => {
                return Err(CommandFormatError::ZeroChannel)
            }
            _ => {}
        }
        let mut buf = CommandBuffer::new();
        write!(buf, "{}", self).map_err(|_| CommandFormatError::BufferOverflow)?;
        buf.try_push_str(eol)
            .map_err(|_| CommandFormatError::BufferOverflow)?;
        Ok(buf)
    }
}
