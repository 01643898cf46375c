//! Event line codec.
//!
//! Every event the pad reports is one ASCII line:
//!
//! ```text
//! <class> <state> <symbol> <timestamp>
//! ```
//!
//! e.g. `A P 3 1204` ("button 3 pressed at 1204 ms").

use super::types::{channel_number, ChannelClass, Transition};
use std::fmt;

/// A decoded event line. Immutable once parsed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RawMessage {
    pub class: ChannelClass,
    pub transition: Transition,
    /// 1-based channel number as reported by the device.
    pub channel: u8,
    /// Milliseconds since the device clock was last reset.
    pub device_ms: u64,
}

/// Why a line is not an event line.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum MessageParseError {
    #[error("empty line")]
    Empty,
    #[error("line too short for an event")]
    TooShort,
    #[error("unknown channel class {0:#04x}")]
    InvalidClass(u8),
    #[error("unknown state {0:#04x}")]
    InvalidTransition(u8),
    #[error("unknown channel symbol {0:#04x}")]
    InvalidChannel(u8),
    #[error("expected a single space at byte {0}")]
    MissingSeparator(usize),
    #[error("timestamp is not a decimal number")]
    InvalidTimestamp,
    #[error("timestamp does not fit in 64 bits")]
    TimestampOverflow,
}

/// Decodes one event line.
///
/// A trailing `\r` and/or `\n` is accepted; anything else after the digits is
/// rejected. Never panics: a mismatch is reported as an error value so the
/// caller can log and skip it.
pub fn parse_message(line: &[u8]) -> Result<RawMessage, MessageParseError> {
    let line = strip_line_ending(line);
    if line.is_empty() {
        return Err(MessageParseError::Empty);
    }
    // class, sp, state, sp, symbol, sp, >=1 digit
    if line.len() < 7 {
        return Err(MessageParseError::TooShort);
    }

    let class = ChannelClass::from_byte(line[0]).ok_or(MessageParseError::InvalidClass(line[0]))?;
    expect_space(line, 1)?;
    let transition =
        Transition::from_byte(line[2]).ok_or(MessageParseError::InvalidTransition(line[2]))?;
    expect_space(line, 3)?;
    let channel = channel_number(line[4]).ok_or(MessageParseError::InvalidChannel(line[4]))?;
    expect_space(line, 5)?;

    let digits = &line[6..];
    let device_ms = parse_timestamp(digits)?;

    Ok(RawMessage {
        class,
        transition,
        channel,
        device_ms,
    })
}

fn strip_line_ending(mut line: &[u8]) -> &[u8] {
    if let [rest @ .., b'\n'] = line {
        line = rest;
    }
    if let [rest @ .., b'\r'] = line {
        line = rest;
    }
    line
}

#[inline]
fn expect_space(line: &[u8], idx: usize) -> Result<(), MessageParseError> {
    if line[idx] == b' ' {
        Ok(())
    } else {
        Err(MessageParseError::MissingSeparator(idx))
    }
}

fn parse_timestamp(digits: &[u8]) -> Result<u64, MessageParseError> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(MessageParseError::InvalidTimestamp);
    }
    digits.iter().try_fold(0u64, |acc, d| {
        acc.checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(d - b'0')))
            .ok_or(MessageParseError::TimestampOverflow)
    })
}

impl fmt::Display for RawMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match (self.class, self.channel) {
            (ChannelClass::Optos, 1) => '[',
            (ChannelClass::Optos, 2) => ']',
            (_, 10) => '0',
            (_, n) => char::from(b'0' + n % 10),
        };
        write!(f, "{} {} {} {}", self.class, self.transition, symbol, self.device_ms)
    }
}

/// An event placed on the host clock.
///
/// `time` is seconds since the host clock origin: the clock reference taken at
/// the last timer reset plus the device offset.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StampedMessage {
    pub raw: RawMessage,
    pub time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_button_press() {
        let msg = parse_message(b"A P 3 12").unwrap();
        assert_eq!(
            msg,
            RawMessage {
                class: ChannelClass::Buttons,
                transition: Transition::Pressed,
                channel: 3,
                device_ms: 12,
            }
        );
    }

    #[test]
    fn test_parse_accepts_line_endings() {
        let expected = parse_message(b"C R ] 5000").unwrap();
        assert_eq!(parse_message(b"C R ] 5000\n").unwrap(), expected);
        assert_eq!(parse_message(b"C R ] 5000\r\n").unwrap(), expected);
        assert_eq!(parse_message(b"C R ] 5000\r").unwrap(), expected);
        assert_eq!(expected.channel, 2);
        assert_eq!(expected.class, ChannelClass::Optos);
    }

    #[test]
    fn test_parse_all_classes() {
        assert_eq!(parse_message(b"M P 1 0").unwrap().class, ChannelClass::VoiceKey);
        assert_eq!(parse_message(b"T R 4 7").unwrap().class, ChannelClass::TtlIn);
        assert_eq!(parse_message(b"A P 0 7").unwrap().channel, 10);
    }

    #[test]
    fn test_timestamp_keeps_every_digit() {
        let msg = parse_message(b"A P 1 18446744073709551615").unwrap();
        assert_eq!(msg.device_ms, u64::MAX);
        let msg = parse_message(b"A P 1 000123").unwrap();
        assert_eq!(msg.device_ms, 123);
    }

    #[test]
    fn test_timestamp_overflow() {
        assert_eq!(
            parse_message(b"A P 1 18446744073709551616"),
            Err(MessageParseError::TimestampOverflow)
        );
    }

    #[test]
    fn test_rejects_malformed_lines() {
        assert_eq!(parse_message(b""), Err(MessageParseError::Empty));
        assert_eq!(parse_message(b"\r\n"), Err(MessageParseError::Empty));
        assert_eq!(parse_message(b"A P 3"), Err(MessageParseError::TooShort));
        assert_eq!(parse_message(b"B P 3 12"), Err(MessageParseError::InvalidClass(b'B')));
        assert_eq!(parse_message(b"A X 3 12"), Err(MessageParseError::InvalidTransition(b'X')));
        assert_eq!(parse_message(b"A P x 12"), Err(MessageParseError::InvalidChannel(b'x')));
        assert_eq!(parse_message(b"A  P 3 12"), Err(MessageParseError::InvalidTransition(b' ')));
        assert_eq!(parse_message(b"AP 3 1234"), Err(MessageParseError::MissingSeparator(1)));
        assert_eq!(parse_message(b"A P 3 12a"), Err(MessageParseError::InvalidTimestamp));
        assert_eq!(parse_message(b"A P 3 -12"), Err(MessageParseError::InvalidTimestamp));
        assert_eq!(parse_message(b"A P 3  12"), Err(MessageParseError::InvalidTimestamp));
        assert_eq!(parse_message(b"A P 3 12 "), Err(MessageParseError::InvalidTimestamp));
    }

    #[test]
    fn test_device_chatter_is_not_an_event() {
        assert!(parse_message(b"TPad firmware v2.1").is_err());
        assert!(parse_message(b"1").is_err());
        assert!(parse_message(b"0").is_err());
    }

    #[test]
    fn test_display_matches_wire_format() {
        for line in ["A P 3 12", "C R ] 5000", "C P [ 1", "A R 0 99", "M P 1 42"] {
            assert_eq!(parse_message(line.as_bytes()).unwrap().to_string(), line);
        }
    }
}
