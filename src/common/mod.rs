// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod command;
pub mod config;
pub mod error;
pub mod frame;
pub mod hal_traits;
pub mod message;
pub mod timing;
pub mod types;

// --- Re-export key types/traits/functions for easier access ---

pub use command::{Command, CommandBuffer, CommandFormatError};
pub use config::{FrameFormat, PadConfig, Parity};
pub use error::PadError;
pub use frame::FrameAssembler;
pub use hal_traits::{PadInstant, PadSerial, PadTimer};
pub use message::{parse_message, MessageParseError, RawMessage, StampedMessage};
pub use types::{channel_number, ChannelClass, InvalidMode, Mode, Transition};
