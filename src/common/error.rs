// src/common/error.rs

use crate::groups::GroupKind;
use std::fmt::Debug;

/// Errors raised by the pad engine.
///
/// Parsing and timing anomalies are never reported through this type; they
/// are logged and absorbed. Only construction failures, transport failures
/// and caller mistakes end up here.
#[derive(Debug, thiserror::Error)]
pub enum PadError<E = ()>
where
    E: Debug,
{
    /// Underlying I/O error from the transport implementation.
    #[error("I/O error: {0:?}")]
    Io(E),

    /// No usable pad on the requested port.
    #[error("could not connect to a TPad on {}; ports found: {available:?}", .requested.as_deref().unwrap_or("<any port>"))]
    Connection {
        requested: Option<String>,
        available: Vec<String>,
    },

    /// A blocking write or flush did not complete in time.
    #[error("Operation timed out")]
    Timeout,

    /// Command did not fit the fixed-size output buffer.
    #[error("Command formatting failed: {0}")]
    CommandFormat(#[from] super::command::CommandFormatError),

    /// The shared pad handle is already borrowed, e.g. from inside a listener callback.
    #[error("pad is busy dispatching messages")]
    Busy,

    /// No registered pad matches the identifier.
    #[error("no pad registered as '{0}'")]
    UnknownPad(String),

    /// The group kind has no threshold command.
    #[error("{0:?} groups have no configurable threshold")]
    ThresholdUnsupported(GroupKind),

    /// Zero-based channel index outside the group.
    #[error("channel {channel} out of range for a group of {count} channels")]
    ChannelOutOfRange { channel: usize, count: usize },
}

impl<E: Debug> PadError<E> {
    /// True for failures that leave the connection unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PadError::Io(_) | PadError::Connection { .. } | PadError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_lists_found_ports() {
        let err: PadError = PadError::Connection {
            requested: Some("COM9".into()),
            available: vec!["COM3".into(), "COM6".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("COM9"));
        assert!(msg.contains("COM3"));
        assert!(msg.contains("COM6"));
    }

    #[test]
    fn test_connection_error_without_request() {
        let err: PadError = PadError::Connection { requested: None, available: vec![] };
        assert!(err.to_string().contains("<any port>"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(PadError::<()>::Io(()).is_fatal());
        assert!(PadError::<()>::Timeout.is_fatal());
        assert!(!PadError::<()>::Busy.is_fatal());
        assert!(!PadError::<()>::UnknownPad("x".into()).is_fatal());
    }
}
