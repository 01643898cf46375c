// src/pad/shared.rs

use super::SyncPad;
use crate::common::{Command, Mode, PadConfig, PadError, PadSerial, PadTimer};
use crate::groups::{GroupNode, Listener, SharedListener};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Cloneable handle to one pad. Every group on the same port holds a clone,
/// so mode, lock and clock state are seen identically by all of them.
///
/// Calls made while another call on the same pad is still running (a listener
/// calling back into the pad, say) fail with [`PadError::Busy`], except
/// [`dispatch_messages`](Self::dispatch_messages), which just returns `Ok(0)`.
pub struct SharedPad<IF>
where
    IF: PadSerial + PadTimer,
{
    inner: Rc<RefCell<SyncPad<IF>>>,
    port: Option<String>,
}

impl<IF> Clone for SharedPad<IF>
where
    IF: PadSerial + PadTimer,
{
    fn clone(&self) -> Self {
        SharedPad {
            inner: Rc::clone(&self.inner),
            port: self.port.clone(),
        }
    }
}

impl<IF> From<SyncPad<IF>> for SharedPad<IF>
where
    IF: PadSerial + PadTimer,
{
    fn from(pad: SyncPad<IF>) -> Self {
        SharedPad {
            port: pad.port().map(str::to_string),
            inner: Rc::new(RefCell::new(pad)),
        }
    }
}

impl<IF> SharedPad<IF>
where
    IF: PadSerial + PadTimer,
{
    /// See [`SyncPad::connect`].
    pub fn connect(interface: IF, config: PadConfig) -> Result<Self, PadError<IF::Error>> {
        SyncPad::connect(interface, config).map(Self::from)
    }

    /// Runs `f` with exclusive access to the pad.
    pub fn with<R>(
        &self,
        f: impl FnOnce(&mut SyncPad<IF>) -> Result<R, PadError<IF::Error>>,
    ) -> Result<R, PadError<IF::Error>> {
        let mut pad = self.inner.try_borrow_mut().map_err(|_| PadError::Busy)?;
        f(&mut pad)
    }

    /// Routes pending input to attached groups. Re-entrant calls are no-ops.
    pub fn dispatch_messages(&self) -> Result<usize, PadError<IF::Error>> {
        match self.inner.try_borrow_mut() {
            Ok(mut pad) => pad.dispatch_messages(),
            Err(_) => {
                log::trace!("dispatch already running");
                Ok(0)
            }
        }
    }

    pub fn set_mode(&self, mode: Mode) -> Result<(), PadError<IF::Error>> {
        self.with(|pad| pad.set_mode(mode))
    }

    pub fn get_mode(&self) -> Result<Option<Mode>, PadError<IF::Error>> {
        self.with(|pad| pad.get_mode())
    }

    /// Tracked mode, without any I/O.
    pub fn mode(&self) -> Result<Option<Mode>, PadError<IF::Error>> {
        self.with(|pad| Ok(pad.mode()))
    }

    pub fn lock_mode(&self) -> Result<Option<Mode>, PadError<IF::Error>> {
        self.with(|pad| Ok(pad.lock_mode()))
    }

    pub fn unlock_mode(&self) -> Result<Option<Mode>, PadError<IF::Error>> {
        self.with(|pad| Ok(pad.unlock_mode()))
    }

    pub fn is_mode_locked(&self) -> Result<bool, PadError<IF::Error>> {
        self.with(|pad| Ok(pad.is_mode_locked()))
    }

    /// Locks the mode until the returned guard is dropped.
    ///
    /// Nested guards are allowed; only the outermost one unlocks.
    pub fn mode_lock(&self) -> Result<ModeLockGuard<IF>, PadError<IF::Error>> {
        let owns = self.with(|pad| {
            let owns = !pad.is_mode_locked();
            pad.lock_mode();
            Ok(owns)
        })?;
        Ok(ModeLockGuard {
            pad: self.clone(),
            owns,
        })
    }

    pub fn reset_timer(&self) -> Result<(), PadError<IF::Error>> {
        self.with(|pad| pad.reset_timer())
    }

    /// See [`SyncPad::dispatch_until`]. `done` must not call back into the pad.
    pub fn dispatch_until<F>(&self, timeout: Duration, done: F) -> Result<bool, PadError<IF::Error>>
    where
        F: FnMut() -> bool,
    {
        self.with(|pad| pad.dispatch_until(timeout, done))
    }

    pub fn pause(&self) -> Result<(), PadError<IF::Error>> {
        self.with(|pad| {
            pad.pause();
            Ok(())
        })
    }

    pub fn config(&self) -> Result<PadConfig, PadError<IF::Error>> {
        self.with(|pad| Ok(pad.config().clone()))
    }

    pub fn send_message(&self, command: &Command) -> Result<(), PadError<IF::Error>> {
        self.with(|pad| pad.send_message(command))
    }

    pub fn await_response(&self, timeout: Duration) -> Result<Option<String>, PadError<IF::Error>> {
        self.with(|pad| pad.await_response(timeout))
    }

    pub fn is_awake(&self) -> Result<bool, PadError<IF::Error>> {
        self.with(|pad| pad.is_awake())
    }

    pub fn firmware(&self) -> Result<Option<String>, PadError<IF::Error>> {
        self.with(|pad| Ok(pad.firmware().map(str::to_string)))
    }

    /// Adds a listener to every group currently attached to this pad.
    pub fn add_listener<L>(&self, listener: Rc<RefCell<L>>) -> Result<(), PadError<IF::Error>>
    where
        L: Listener + 'static,
    {
        let listener: SharedListener = listener;
        self.with(|pad| {
            pad.add_listener(listener);
            Ok(())
        })
    }

    pub(crate) fn attach(&self, node: &Rc<RefCell<GroupNode>>) -> Result<(), PadError<IF::Error>> {
        self.with(|pad| {
            pad.attach_node(node);
            Ok(())
        })
    }

    /// Canonical port, `None` if unknown.
    pub fn port(&self) -> Option<String> {
        self.port.clone()
    }

    /// True if both handles point at the same connection.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Same connection, or two connections on the same port.
    pub fn is_same_device(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        matches!((&self.port, &other.port), (Some(a), Some(b)) if a == b)
    }
}

/// Holds the mode lock of a pad; unlocks on drop if it took the lock.
pub struct ModeLockGuard<IF>
where
    IF: PadSerial + PadTimer,
{
    pad: SharedPad<IF>,
    owns: bool,
}

impl<IF> ModeLockGuard<IF>
where
    IF: PadSerial + PadTimer,
{
    pub fn pad(&self) -> &SharedPad<IF> {
        &self.pad
    }
}

impl<IF> Drop for ModeLockGuard<IF>
where
    IF: PadSerial + PadTimer,
{
    fn drop(&mut self) {
        if !self.owns {
            return;
        }
        match self.pad.inner.try_borrow_mut() {
            Ok(mut pad) => {
                pad.unlock_mode();
            }
            Err(_) => log::warn!("pad busy, mode lock left in place"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::{GroupKind, TypedResponse};
    use crate::transport::MockInterface;

    fn shared(mock: &MockInterface) -> SharedPad<MockInterface> {
        SyncPad::new(mock.clone(), PadConfig::new("COM6").with_check_awake(false)).into()
    }

    #[test]
    fn test_clones_share_state() {
        let mock = MockInterface::new();
        let a = shared(&mock);
        let b = a.clone();
        a.set_mode(Mode::Streaming).unwrap();
        assert_eq!(b.mode().unwrap(), Some(Mode::Streaming));
        assert!(a.ptr_eq(&b));
        assert!(a.is_same_device(&b));
    }

    #[test]
    fn test_same_port_is_same_device() {
        let a = shared(&MockInterface::new());
        let b = shared(&MockInterface::new());
        assert!(!a.ptr_eq(&b));
        assert!(a.is_same_device(&b));
        assert_eq!(a.port().as_deref(), Some("COM6"));
    }

    #[test]
    fn test_mode_lock_guard() {
        let mock = MockInterface::new();
        let pad = shared(&mock);
        pad.set_mode(Mode::Settings).unwrap();
        {
            let _outer = pad.mode_lock().unwrap();
            {
                let _inner = pad.mode_lock().unwrap();
            }
            assert!(pad.is_mode_locked().unwrap());
            mock.clear_written();
            pad.set_mode(Mode::Streaming).unwrap();
            assert!(mock.written().is_empty());
        }
        assert!(!pad.is_mode_locked().unwrap());
        pad.set_mode(Mode::Streaming).unwrap();
        assert_eq!(mock.written_lines(), vec!["X", "MOD3"]);
    }

    #[test]
    fn test_reentrant_dispatch_is_noop() {
        let mock = MockInterface::new();
        let pad = shared(&mock);
        let node = Rc::new(RefCell::new(GroupNode::new(GroupKind::Button, 10)));
        pad.attach(&node).unwrap();

        let inner_calls: Rc<RefCell<Vec<usize>>> = Rc::default();
        let record = inner_calls.clone();
        let handle = pad.clone();
        let listener = Rc::new(RefCell::new(move |_: &TypedResponse| {
            record.borrow_mut().push(handle.dispatch_messages().unwrap());
            assert!(matches!(handle.set_mode(Mode::Settings), Err(PadError::Busy)));
        }));
        pad.add_listener(listener).unwrap();

        mock.inject_read(b"A P 1 10\nA R 1 20\n");
        assert_eq!(pad.dispatch_messages().unwrap(), 2);
        assert_eq!(*inner_calls.borrow(), vec![0, 0]);
    }

    #[test]
    fn test_same_device_from_inside_listener() {
        let mock = MockInterface::new();
        let a = shared(&mock);
        let b = shared(&MockInterface::new());
        let node = Rc::new(RefCell::new(GroupNode::new(GroupKind::Button, 10)));
        a.attach(&node).unwrap();

        let answers: Rc<RefCell<Vec<bool>>> = Rc::default();
        let record = answers.clone();
        let (inner_a, inner_b) = (a.clone(), b.clone());
        a.add_listener(Rc::new(RefCell::new(move |_: &TypedResponse| {
            record.borrow_mut().push(inner_a.is_same_device(&inner_b));
            assert_eq!(inner_a.port().as_deref(), Some("COM6"));
        })))
        .unwrap();

        mock.inject_read(b"A P 1 10\n");
        a.dispatch_messages().unwrap();
        assert_eq!(*answers.borrow(), vec![true]);
    }
}
