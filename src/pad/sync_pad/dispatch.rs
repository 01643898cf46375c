// src/pad/sync_pad/dispatch.rs

use super::SyncPad;
use crate::common::{
    error::PadError,
    hal_traits::{PadInstant, PadSerial, PadTimer},
    message::{parse_message, RawMessage, StampedMessage},
    timing,
};
use crate::groups::{GroupNode, SharedListener};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Result of one read pass.
#[derive(Debug, Default)]
pub(super) struct Pumped {
    /// Bytes taken off the transport.
    pub bytes: usize,
    /// Event lines decoded and routed.
    pub events: usize,
    /// Complete lines that were not events, in arrival order.
    pub replies: Vec<String>,
}

impl<IF> SyncPad<IF>
where
    IF: PadSerial + PadTimer,
{
    /// Reads what the pad has sent, and routes every complete event line to the
    /// attached groups. Returns the number of events routed.
    ///
    /// Never blocks. A line split across reads is completed on a later call.
    /// Non-event lines that nobody is waiting for are logged and dropped.
    pub fn dispatch_messages(&mut self) -> Result<usize, PadError<IF::Error>> {
        let pumped = self.pump()?;
        for line in &pumped.replies {
            log::debug!("unsolicited line from pad: {:?}", line);
        }
        Ok(pumped.events)
    }

    pub(super) fn pump(&mut self) -> Result<Pumped, PadError<IF::Error>> {
        let data = self.read_available()?;
        let mut pumped = Pumped {
            bytes: data.len(),
            ..Pumped::default()
        };
        if data.is_empty() {
            return Ok(pumped);
        }

        for line in self.assembler.push(&data) {
            match parse_message(line.as_bytes()) {
                Ok(raw) => {
                    self.handle_event(raw, line);
                    pumped.events += 1;
                }
                Err(e) => {
                    log::trace!("non-event line {:?}: {}", line, e);
                    pumped.replies.push(line);
                }
            }
        }
        Ok(pumped)
    }

    fn handle_event(&mut self, raw: RawMessage, line: String) {
        let key = self.timestamp_for(raw.device_ms);
        let message = StampedMessage {
            raw,
            time: key.as_secs_f64(),
        };
        log::trace!("event {} at {:.4}s", raw, message.time);
        self.messages.entry(key).or_default().push(line);
        if let Some(limit) = self.config.message_log_limit {
            while self.messages.len() > limit {
                self.messages.pop_first();
            }
        }
        self.route(&message);
    }

    /// Keeps dispatching until `done` returns true or `timeout` passes.
    /// Returns whether `done` was satisfied.
    pub fn dispatch_until<F>(&mut self, timeout: Duration, mut done: F) -> Result<bool, PadError<IF::Error>>
    where
        F: FnMut() -> bool,
    {
        let deadline = self.interface.now() + timeout;
        loop {
            self.dispatch_messages()?;
            if done() {
                return Ok(true);
            }
            if self.interface.now() >= deadline {
                return Ok(false);
            }
            self.delay(timing::POLL_INTERVAL);
        }
    }

    /// Host-clock offset of a device timestamp, relative to the clock origin.
    pub(super) fn timestamp_for(&self, device_ms: u64) -> Duration {
        let base = self
            .timer_reference
            .map(|reference| reference.since_origin())
            .unwrap_or(Duration::ZERO);
        base + Duration::from_millis(device_ms)
    }

    /// Hands a message to every live group that consumes its channel class.
    fn route(&mut self, message: &StampedMessage) {
        self.nodes.retain(|node| node.strong_count() > 0);
        let nodes: Vec<_> = self.nodes.iter().filter_map(Weak::upgrade).collect();

        for node in nodes {
            let (response, listeners) = {
                let Ok(mut group) = node.try_borrow_mut() else {
                    log::warn!("group busy, dropping {}", message.raw);
                    continue;
                };
                if !group.accepts(message.raw.class) {
                    continue;
                }
                let response = group.parse_message(message);
                group.receive_message(response);
                (response, group.listeners().to_vec())
            };

            for listener in listeners {
                match listener.try_borrow_mut() {
                    Ok(mut listener) => listener.receive_message(&response),
                    Err(_) => log::warn!("listener busy, skipping response for channel {}", response.channel),
                }
            }
        }
    }

    /// Attaches a group so it receives routed events.
    pub fn attach_node(&mut self, node: &Rc<RefCell<GroupNode>>) {
        if self.nodes.iter().any(|n| std::ptr::eq(n.as_ptr(), Rc::as_ptr(node))) {
            return;
        }
        self.nodes.push(Rc::downgrade(node));
        log::debug!(
            "attached {:?} group to {}",
            node.borrow().kind(),
            self.port.as_deref().unwrap_or("<unknown port>")
        );
    }

    /// Number of groups still alive and attached.
    pub fn attached_groups(&self) -> usize {
        self.nodes.iter().filter(|n| n.strong_count() > 0).count()
    }

    /// Adds `listener` to every attached group.
    pub fn add_listener(&mut self, listener: SharedListener) {
        for node in self.nodes.iter().filter_map(Weak::upgrade) {
            node.borrow_mut().add_listener(listener.clone());
        }
    }

    /// Raw event lines received, keyed by host-clock offset.
    ///
    /// Grows with every event unless `message_log_limit` is set; hosts that
    /// only consume through listeners should clear it periodically.
    pub fn message_log(&self) -> &BTreeMap<Duration, Vec<String>> {
        &self.messages
    }

    pub fn clear_message_log(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PadConfig;
    use crate::groups::{GroupKind, TypedResponse};
    use crate::transport::MockInterface;

    fn pad(mock: &MockInterface) -> SyncPad<MockInterface> {
        SyncPad::new(mock.clone(), PadConfig::default())
    }

    fn node(kind: GroupKind) -> Rc<RefCell<GroupNode>> {
        Rc::new(RefCell::new(GroupNode::new(kind, kind.default_channels())))
    }

    #[test]
    fn test_split_line_dispatches_once() {
        let mock = MockInterface::new();
        let mut pad = pad(&mock);
        let buttons = node(GroupKind::Button);
        pad.attach_node(&buttons);

        mock.inject_read(b"A P");
        assert_eq!(pad.dispatch_messages().unwrap(), 0);
        assert!(buttons.borrow().responses().is_empty());

        mock.inject_read(b" 3 12\n");
        assert_eq!(pad.dispatch_messages().unwrap(), 1);

        let responses = buttons.borrow().responses().to_vec();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].channel, 2);
        assert!(responses[0].value);
        assert!((responses[0].time - 0.012).abs() < 1e-9);
    }

    #[test]
    fn test_routing_is_channel_exclusive() {
        let mock = MockInterface::new();
        let mut pad = pad(&mock);
        let buttons = node(GroupKind::Button);
        let photodiodes = node(GroupKind::Photodiode);
        let voice = node(GroupKind::SoundSensor);
        pad.attach_node(&buttons);
        pad.attach_node(&photodiodes);
        pad.attach_node(&voice);

        mock.inject_read(b"A P 1 10\nC P 2 11\nM R 1 12\nT P 1 13\n");
        assert_eq!(pad.dispatch_messages().unwrap(), 4);

        assert_eq!(buttons.borrow().responses().len(), 1);
        assert_eq!(photodiodes.borrow().responses().len(), 1);
        assert_eq!(voice.borrow().responses().len(), 1);
        assert!(!voice.borrow().responses()[0].value);
        assert_eq!(pad.message_log().len(), 4);
    }

    #[test]
    fn test_optos_feed_both_opto_kinds() {
        let mock = MockInterface::new();
        let mut pad = pad(&mock);
        let photodiodes = node(GroupKind::Photodiode);
        let light = node(GroupKind::LightSensor);
        pad.attach_node(&photodiodes);
        pad.attach_node(&light);

        mock.inject_read(b"C P 1 5\n");
        pad.dispatch_messages().unwrap();
        assert_eq!(photodiodes.borrow().responses().len(), 1);
        assert_eq!(light.borrow().responses().len(), 1);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let mock = MockInterface::new();
        let mut pad = pad(&mock);
        let buttons = node(GroupKind::Button);
        pad.attach_node(&buttons);

        mock.inject_read(b"A P 3\nQ P 1 10\nA P 1 abc\nA P 1 20\n");
        assert_eq!(pad.dispatch_messages().unwrap(), 1);
        assert_eq!(buttons.borrow().responses().len(), 1);
    }

    #[test]
    fn test_timestamps_follow_clock_reference() {
        let mock = MockInterface::new();
        let mut pad = pad(&mock);
        mock.advance(Duration::from_secs(2));
        pad.timer_reference = Some(pad.interface.now());

        assert_eq!(pad.timestamp_for(0), Duration::from_secs(2));
        assert_eq!(pad.timestamp_for(1500), Duration::from_millis(3500));
        assert!(pad.timestamp_for(10) < pad.timestamp_for(11));
    }

    #[test]
    fn test_dropped_group_is_detached() {
        let mock = MockInterface::new();
        let mut pad = pad(&mock);
        let buttons = node(GroupKind::Button);
        pad.attach_node(&buttons);
        pad.attach_node(&buttons);
        assert_eq!(pad.attached_groups(), 1);

        drop(buttons);
        mock.inject_read(b"A P 1 10\n");
        assert_eq!(pad.dispatch_messages().unwrap(), 1);
        assert_eq!(pad.attached_groups(), 0);
    }

    #[test]
    fn test_listeners_receive_typed_responses() {
        let mock = MockInterface::new();
        let mut pad = pad(&mock);
        let buttons = node(GroupKind::Button);
        pad.attach_node(&buttons);

        let seen: Rc<RefCell<Vec<TypedResponse>>> = Rc::default();
        let sink = seen.clone();
        let listener: SharedListener = Rc::new(RefCell::new(move |r: &TypedResponse| {
            sink.borrow_mut().push(*r)
        }));
        pad.add_listener(listener);

        mock.inject_read(b"A P 0 10\nC P 1 11\n");
        pad.dispatch_messages().unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].channel, 9);
    }

    #[test]
    fn test_message_log_limit_drops_oldest() {
        let mock = MockInterface::new();
        let mut pad = SyncPad::new(mock.clone(), PadConfig::default().with_message_log_limit(2));
        mock.inject_read(b"A P 1 10\nA R 1 20\nA P 1 30\n");
        assert_eq!(pad.dispatch_messages().unwrap(), 3);

        let kept: Vec<_> = pad.message_log().keys().copied().collect();
        assert_eq!(kept, vec![Duration::from_millis(20), Duration::from_millis(30)]);
    }

    #[test]
    fn test_dispatch_until_waits_for_events() {
        let mock = MockInterface::new();
        let mut pad = pad(&mock);
        let buttons = node(GroupKind::Button);
        pad.attach_node(&buttons);

        mock.schedule_read(Duration::from_millis(30), b"A P 2 40\n");
        let seen = buttons.clone();
        let done = pad
            .dispatch_until(Duration::from_millis(100), || !seen.borrow().responses().is_empty())
            .unwrap();
        assert!(done);
        assert!(mock.now_us() >= 30_000);

        let quiet = pad
            .dispatch_until(Duration::from_millis(10), || buttons.borrow().responses().len() > 1)
            .unwrap();
        assert!(!quiet);
        assert!(mock.now_us() >= 40_000);
    }
}
