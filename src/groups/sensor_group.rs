// src/groups/sensor_group.rs

use super::{GroupKind, GroupNode, Listener, SharedListener, TypedResponse};
use crate::common::{Mode, PadError, PadSerial, PadTimer, StampedMessage};
use crate::pad::SharedPad;
use std::cell::RefCell;
use std::rc::Rc;

/// A typed view onto one pad: its buttons, photodiodes, light sensors or
/// sound sensor.
///
/// Any number of groups can share a pad. Each receives only the events of its
/// own channel class; mode, lock and clock live on the pad and are common to
/// all of them.
pub struct SensorGroup<IF>
where
    IF: PadSerial + PadTimer,
{
    pub(super) pad: SharedPad<IF>,
    pub(super) node: Rc<RefCell<GroupNode>>,
}

impl<IF> SensorGroup<IF>
where
    IF: PadSerial + PadTimer,
{
    /// Attaches a new group of `kind` with `channels` channels to `pad`.
    pub fn new(pad: &SharedPad<IF>, kind: GroupKind, channels: usize) -> Result<Self, PadError<IF::Error>> {
        let node = Rc::new(RefCell::new(GroupNode::new(kind, channels)));
        pad.attach(&node)?;
        Ok(SensorGroup {
            pad: pad.clone(),
            node,
        })
    }

    pub fn buttons(pad: &SharedPad<IF>) -> Result<Self, PadError<IF::Error>> {
        Self::with_default_channels(pad, GroupKind::Button)
    }

    pub fn photodiodes(pad: &SharedPad<IF>) -> Result<Self, PadError<IF::Error>> {
        Self::with_default_channels(pad, GroupKind::Photodiode)
    }

    pub fn light_sensors(pad: &SharedPad<IF>) -> Result<Self, PadError<IF::Error>> {
        Self::with_default_channels(pad, GroupKind::LightSensor)
    }

    pub fn sound_sensors(pad: &SharedPad<IF>) -> Result<Self, PadError<IF::Error>> {
        Self::with_default_channels(pad, GroupKind::SoundSensor)
    }

    fn with_default_channels(pad: &SharedPad<IF>, kind: GroupKind) -> Result<Self, PadError<IF::Error>> {
        Self::new(pad, kind, kind.default_channels())
    }

    pub fn kind(&self) -> GroupKind {
        self.node.borrow().kind()
    }

    pub fn channels(&self) -> usize {
        self.node.borrow().channels()
    }

    pub fn pad(&self) -> &SharedPad<IF> {
        &self.pad
    }

    /// Same physical pad: shared handle or equal port.
    pub fn is_same_device(&self, other: &SensorGroup<IF>) -> bool {
        self.pad.is_same_device(&other.pad)
    }

    /// See [`GroupNode::parse_message`].
    pub fn parse_message(&self, message: &StampedMessage) -> TypedResponse {
        self.node.borrow().parse_message(message)
    }

    pub fn add_listener<L>(&self, listener: Rc<RefCell<L>>)
    where
        L: Listener + 'static,
    {
        let listener: SharedListener = listener;
        self.node.borrow_mut().add_listener(listener);
    }

    /// Responses buffered since the last [`take_responses`](Self::take_responses).
    ///
    /// Every routed event is kept here, even when listeners are attached, until
    /// taken or cleared.
    pub fn responses(&self) -> Vec<TypedResponse> {
        self.node.borrow().responses().to_vec()
    }

    pub fn clear_responses(&self) {
        self.node.borrow_mut().clear_responses();
    }

    pub fn take_responses(&self) -> Vec<TypedResponse> {
        self.node.borrow_mut().take_responses()
    }

    /// Last threshold set on the zero-based `channel`.
    pub fn threshold(&self, channel: usize) -> Option<u8> {
        self.node.borrow().threshold(channel)
    }

    pub fn dispatch_messages(&self) -> Result<usize, PadError<IF::Error>> {
        self.pad.dispatch_messages()
    }

    pub fn set_mode(&self, mode: Mode) -> Result<(), PadError<IF::Error>> {
        self.pad.set_mode(mode)
    }

    pub fn get_mode(&self) -> Result<Option<Mode>, PadError<IF::Error>> {
        self.pad.get_mode()
    }

    pub fn reset_timer(&self) -> Result<(), PadError<IF::Error>> {
        self.pad.reset_timer()
    }
}
