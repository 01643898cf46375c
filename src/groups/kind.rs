// src/groups/kind.rs

use crate::common::{ChannelClass, Command};
use crate::discovery::{Discovery, GroupDescriptor};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The four kinds of sensor group a pad exposes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GroupKind {
    Button,
    Photodiode,
    LightSensor,
    SoundSensor,
}

impl GroupKind {
    pub const ALL: [GroupKind; 4] = [
        GroupKind::Button,
        GroupKind::Photodiode,
        GroupKind::LightSensor,
        GroupKind::SoundSensor,
    ];

    /// True if this kind consumes events of `class`. TTL inputs have no consumer.
    pub const fn accepts(&self, class: ChannelClass) -> bool {
        matches!(
            (self, class),
            (GroupKind::Button, ChannelClass::Buttons)
                | (GroupKind::Photodiode, ChannelClass::Optos)
                | (GroupKind::LightSensor, ChannelClass::Optos)
                | (GroupKind::SoundSensor, ChannelClass::VoiceKey)
        )
    }

    pub const fn default_channels(&self) -> usize {
        match self {
            GroupKind::Button => 10,
            GroupKind::Photodiode | GroupKind::LightSensor => 2,
            GroupKind::SoundSensor => 1,
        }
    }

    /// Suffix appended to the pad name to name a group of this kind.
    pub const fn name_suffix(&self) -> &'static str {
        match self {
            GroupKind::Button => "_buttons",
            GroupKind::Photodiode => "_photodiodes",
            GroupKind::LightSensor => "_lightsensors",
            GroupKind::SoundSensor => "_voicekeys",
        }
    }

    pub const fn supports_threshold(&self) -> bool {
        !matches!(self, GroupKind::Button)
    }

    /// Threshold command for the 1-based `channel`, `None` for buttons.
    pub const fn threshold_command(&self, channel: u8, level: u8) -> Option<Command> {
        match self {
            GroupKind::Button => None,
            GroupKind::Photodiode | GroupKind::LightSensor => {
                Some(Command::SetOptoThreshold { channel, level })
            }
            GroupKind::SoundSensor => Some(Command::SetVoiceKeyThreshold { channel, level }),
        }
    }

    /// One descriptor of this kind per discovered pad.
    pub fn available_devices(&self, discovery: &dyn Discovery) -> Vec<GroupDescriptor> {
        discovery
            .available_pads()
            .into_iter()
            .map(|pad| GroupDescriptor {
                name: format!("{}{}", pad.name, self.name_suffix()),
                port: pad.port,
                kind: *self,
                channels: self.default_channels(),
            })
            .collect()
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupKind::Button => "button",
            GroupKind::Photodiode => "photodiode",
            GroupKind::LightSensor => "light sensor",
            GroupKind::SoundSensor => "sound sensor",
        };
        f.write_str(name)
    }
}
