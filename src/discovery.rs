// src/discovery.rs

//! Finding pads attached to the host.

use crate::common::{PadError, PadSerial, PadTimer};
use crate::groups::GroupKind;
use crate::pad::SharedPad;
use crate::registry::canonical_port;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A pad seen on the host, not necessarily opened.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PadDescriptor {
    pub name: String,
    pub port: String,
}

impl PadDescriptor {
    pub fn new(name: impl Into<String>, port: impl Into<String>) -> Self {
        PadDescriptor {
            name: name.into(),
            port: port.into(),
        }
    }
}

/// A sensor group that could be opened on a discovered pad.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupDescriptor {
    pub name: String,
    pub port: String,
    pub kind: GroupKind,
    pub channels: usize,
}

/// Source of the pads currently attached.
pub trait Discovery {
    fn available_pads(&self) -> Vec<PadDescriptor>;

    fn available_ports(&self) -> Vec<String> {
        self.available_pads().into_iter().map(|pad| pad.port).collect()
    }
}

impl<F> Discovery for F
where
    F: Fn() -> Vec<PadDescriptor>,
{
    fn available_pads(&self) -> Vec<PadDescriptor> {
        self()
    }
}

/// A fixed list of pads, for hosts where the ports are known up front.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    pads: Vec<PadDescriptor>,
}

impl StaticDiscovery {
    pub fn new(pads: Vec<PadDescriptor>) -> Self {
        StaticDiscovery { pads }
    }
}

impl Discovery for StaticDiscovery {
    fn available_pads(&self) -> Vec<PadDescriptor> {
        self.pads.clone()
    }
}

/// Opens a pad on `port`, or on the first discovered pad when `port` is `None`.
///
/// Any failure to bring the pad up is reported as [`PadError::Connection`]
/// listing the ports that were found.
pub fn open_pad<IF, F>(
    discovery: &dyn Discovery,
    port: Option<&str>,
    open: F,
) -> Result<SharedPad<IF>, PadError<IF::Error>>
where
    IF: PadSerial + PadTimer,
    F: FnOnce(&str) -> Result<SharedPad<IF>, PadError<IF::Error>>,
{
    let available = discovery.available_ports();
    let target = match port {
        Some(port) => canonical_port(port),
        None => match available.first() {
            Some(first) => canonical_port(first),
            None => {
                log::error!("no TPad found");
                return Err(PadError::Connection {
                    requested: None,
                    available,
                });
            }
        },
    };

    open(&target).map_err(|e| {
        log::error!("failed to open TPad on {}: {}", target, e);
        match e {
            PadError::Connection { .. } | PadError::Io(_) | PadError::Timeout => PadError::Connection {
                requested: Some(target.clone()),
                available: available.clone(),
            },
            other => other,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PadConfig;
    use crate::transport::MockInterface;

    fn discovery() -> StaticDiscovery {
        StaticDiscovery::new(vec![
            PadDescriptor::new("BBTKTPAD01", "com6"),
            PadDescriptor::new("BBTKTPAD02", "COM7"),
        ])
    }

    fn open_mock(port: &str) -> Result<SharedPad<MockInterface>, PadError<crate::transport::mock::MockCommError>> {
        let mock = MockInterface::new();
        mock.respond("FIRM", b"TPAD v2.1\r\n");
        SharedPad::connect(mock, PadConfig::new(port))
    }

    #[test]
    fn test_open_first_discovered() {
        let pad = open_pad(&discovery(), None, open_mock).unwrap();
        assert_eq!(pad.port().as_deref(), Some("COM6"));
    }

    #[test]
    fn test_open_requested_port() {
        let pad = open_pad(&discovery(), Some("COM7"), open_mock).unwrap();
        assert_eq!(pad.port().as_deref(), Some("COM7"));
    }

    #[test]
    fn test_nothing_found() {
        let none = StaticDiscovery::default();
        let err = open_pad(&none, None, open_mock).err().unwrap();
        assert!(matches!(err, PadError::Connection { requested: None, .. }));
    }

    #[test]
    fn test_silent_pad_lists_found_ports() {
        let silent = |port: &str| SharedPad::connect(MockInterface::new(), PadConfig::new(port));
        match open_pad(&discovery(), Some("COM9"), silent) {
            Err(PadError::Connection { requested, available }) => {
                assert_eq!(requested.as_deref(), Some("COM9"));
                assert_eq!(available, vec!["com6".to_string(), "COM7".to_string()]);
            }
            other => panic!("expected connection error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_closure_discovery() {
        let source = || vec![PadDescriptor::new("pad", "/dev/ttyACM0")];
        assert_eq!(source.available_ports(), vec!["/dev/ttyACM0".to_string()]);
    }
}
