// src/groups/node.rs

use super::{GroupKind, SharedListener, TypedResponse};
use crate::common::{ChannelClass, StampedMessage};

/// Group state shared between a [`SensorGroup`](super::SensorGroup) and the
/// pad routing events to it.
pub struct GroupNode {
    kind: GroupKind,
    channels: usize,
    thresholds: Vec<Option<u8>>,
    listeners: Vec<SharedListener>,
    responses: Vec<TypedResponse>,
}

impl GroupNode {
    pub fn new(kind: GroupKind, channels: usize) -> Self {
        GroupNode {
            kind,
            channels,
            thresholds: vec![None; channels],
            listeners: Vec::new(),
            responses: Vec::new(),
        }
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn accepts(&self, class: ChannelClass) -> bool {
        self.kind.accepts(class)
    }

    /// Converts a routed event into this group's view of it.
    pub fn parse_message(&self, message: &StampedMessage) -> TypedResponse {
        let channel = usize::from(message.raw.channel.saturating_sub(1));
        if channel >= self.channels {
            log::debug!(
                "{} event on channel {} outside a {}-channel group",
                self.kind,
                channel,
                self.channels
            );
        }
        let threshold = if self.kind.supports_threshold() {
            self.threshold(channel)
        } else {
            None
        };
        TypedResponse {
            time: message.time,
            channel,
            value: message.raw.transition.is_on(),
            threshold,
        }
    }

    /// Buffers a response for later retrieval.
    ///
    /// The buffer is unbounded. Hosts that only consume through listeners
    /// should call [`take_responses`](Self::take_responses) or
    /// [`clear_responses`](Self::clear_responses) now and then.
    pub fn receive_message(&mut self, response: TypedResponse) {
        self.responses.push(response);
    }

    pub fn responses(&self) -> &[TypedResponse] {
        &self.responses
    }

    pub fn clear_responses(&mut self) {
        self.responses.clear();
    }

    pub fn take_responses(&mut self) -> Vec<TypedResponse> {
        std::mem::take(&mut self.responses)
    }

    pub fn listeners(&self) -> &[SharedListener] {
        &self.listeners
    }

    pub fn add_listener(&mut self, listener: SharedListener) {
        self.listeners.push(listener);
    }

    /// Last threshold set on the zero-based `channel`.
    pub fn threshold(&self, channel: usize) -> Option<u8> {
        self.thresholds.get(channel).copied().flatten()
    }

    pub(crate) fn store_threshold(&mut self, channel: usize, level: u8) {
        if let Some(slot) = self.thresholds.get_mut(channel) {
            *slot = Some(level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::parse_message;

    fn stamped(line: &[u8], time: f64) -> StampedMessage {
        StampedMessage {
            raw: parse_message(line).unwrap(),
            time,
        }
    }

    #[test]
    fn test_parse_message_is_zero_based() {
        let node = GroupNode::new(GroupKind::Button, 10);
        let response = node.parse_message(&stamped(b"A P 1 10", 0.01));
        assert_eq!(response.channel, 0);
        assert!(response.value);
        assert_eq!(response.threshold, None);

        let response = node.parse_message(&stamped(b"A R 0 20", 0.02));
        assert_eq!(response.channel, 9);
        assert!(!response.value);
    }

    #[test]
    fn test_parse_message_snapshots_threshold() {
        let mut node = GroupNode::new(GroupKind::Photodiode, 2);
        node.store_threshold(1, 120);
        let response = node.parse_message(&stamped(b"C P 2 10", 1.0));
        assert_eq!(response.channel, 1);
        assert_eq!(response.threshold, Some(120));

        let other = node.parse_message(&stamped(b"C P 1 10", 1.0));
        assert_eq!(other.threshold, None);
    }

    #[test]
    fn test_buttons_never_carry_threshold() {
        let mut node = GroupNode::new(GroupKind::Button, 10);
        node.store_threshold(0, 50);
        let response = node.parse_message(&stamped(b"A P 1 10", 1.0));
        assert_eq!(response.threshold, None);
    }

    #[test]
    fn test_out_of_range_threshold_is_ignored() {
        let mut node = GroupNode::new(GroupKind::SoundSensor, 1);
        node.store_threshold(3, 50);
        assert_eq!(node.threshold(3), None);
    }

    #[test]
    fn test_response_buffer() {
        let mut node = GroupNode::new(GroupKind::Button, 10);
        let response = node.parse_message(&stamped(b"A P 4 10", 0.01));
        node.receive_message(response);
        assert_eq!(node.responses().len(), 1);
        assert_eq!(node.take_responses().len(), 1);
        assert!(node.responses().is_empty());
    }
}
