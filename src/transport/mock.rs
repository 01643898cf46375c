//! Mock pad transport for testing
//!
//! Simulates the serial link and a virtual clock. Bytes the host writes are
//! logged; complete command lines can be answered with scripted replies.
//! Delays advance the virtual clock instead of sleeping.

use crate::common::{PadInstant, PadSerial, PadTimer};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::ops::{Add, Sub};
use std::rc::Rc;
use std::time::Duration;

/// Virtual-clock instant in microseconds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MockInstant(pub u64);

impl Add<Duration> for MockInstant {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self {
        MockInstant(self.0.saturating_add(rhs.as_micros() as u64))
    }
}

impl Sub<MockInstant> for MockInstant {
    type Output = Duration;
    fn sub(self, rhs: MockInstant) -> Duration {
        Duration::from_micros(self.0.saturating_sub(rhs.0))
    }
}

impl PadInstant for MockInstant {
    fn since_origin(&self) -> Duration {
        Duration::from_micros(self.0)
    }
}

/// Error returned once the mock is told to fail.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MockCommError;

impl fmt::Display for MockCommError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mock serial failure")
    }
}

type Responder = Box<dyn FnMut(&str) -> Option<Vec<u8>>>;

#[derive(Default)]
struct MockState {
    now_us: u64,
    read_queue: VecDeque<u8>,
    scheduled: Vec<(u64, Vec<u8>)>,
    written: Vec<u8>,
    line: Vec<u8>,
    replies: HashMap<String, Vec<u8>>,
    responder: Option<Responder>,
    fail_reads: bool,
    fail_writes: bool,
    port: Option<String>,
}

impl MockState {
    fn release_scheduled(&mut self) {
        let now = self.now_us;
        let mut due = Vec::new();
        self.scheduled.retain(|(at, bytes)| {
            if *at <= now {
                due.push((*at, bytes.clone()));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(at, _)| *at);
        for (_, bytes) in due {
            self.read_queue.extend(bytes);
        }
    }

    fn on_line_written(&mut self, line: &str) {
        let reply = match self.responder.as_mut().and_then(|r| r(line)) {
            Some(reply) => Some(reply),
            None => self.replies.get(line).cloned(),
        };
        if let Some(reply) = reply {
            self.read_queue.extend(reply);
        }
    }
}

/// Mock transport; clones share state so a test keeps a handle after the
/// interface has been moved into a pad.
#[derive(Clone, Default)]
pub struct MockInterface {
    inner: Rc<RefCell<MockState>>,
}

impl MockInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(port: &str) -> Self {
        let mock = Self::new();
        mock.inner.borrow_mut().port = Some(port.to_string());
        mock
    }

    /// Queue bytes for the host to read immediately.
    pub fn inject_read(&self, data: &[u8]) {
        self.inner.borrow_mut().read_queue.extend(data);
    }

    /// Queue bytes that become readable once the virtual clock has advanced by `after`.
    pub fn schedule_read(&self, after: Duration, data: &[u8]) {
        let mut inner = self.inner.borrow_mut();
        let at = inner.now_us + after.as_micros() as u64;
        inner.scheduled.push((at, data.to_vec()));
    }

    /// Answer every write of `command` (without line ending) with `reply`.
    pub fn respond(&self, command: &str, reply: &[u8]) {
        self.inner
            .borrow_mut()
            .replies
            .insert(command.to_string(), reply.to_vec());
    }

    /// Answer commands dynamically. Takes precedence over [`respond`](Self::respond)
    /// when it returns `Some`.
    pub fn respond_with<F>(&self, responder: F)
    where
        F: FnMut(&str) -> Option<Vec<u8>> + 'static,
    {
        self.inner.borrow_mut().responder = Some(Box::new(responder));
    }

    /// Every command line written so far, line endings stripped.
    pub fn written_lines(&self) -> Vec<String> {
        self.inner
            .borrow()
            .written
            .split(|&b| b == b'\n')
            .filter(|l| !l.is_empty())
            .map(|l| String::from_utf8_lossy(l.strip_suffix(b"\r").unwrap_or(l)).into_owned())
            .collect()
    }

    /// Raw bytes written so far.
    pub fn written(&self) -> Vec<u8> {
        self.inner.borrow().written.clone()
    }

    pub fn clear_written(&self) {
        self.inner.borrow_mut().written.clear();
    }

    /// Bytes still waiting to be read (scheduled bytes not included).
    pub fn pending_read(&self) -> usize {
        self.inner.borrow().read_queue.len()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.borrow_mut().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    pub fn now_us(&self) -> u64 {
        self.inner.borrow().now_us
    }

    pub fn advance(&self, by: Duration) {
        let mut inner = self.inner.borrow_mut();
        inner.now_us = inner.now_us.saturating_add(by.as_micros() as u64);
        inner.release_scheduled();
    }
}

impl PadTimer for MockInterface {
    type Instant = MockInstant;

    fn now(&self) -> MockInstant {
        MockInstant(self.inner.borrow().now_us)
    }

    fn delay_us(&mut self, us: u32) {
        self.advance(Duration::from_micros(u64::from(us)));
    }
}

impl PadSerial for MockInterface {
    type Error = MockCommError;

    fn read_byte(&mut self) -> nb::Result<u8, MockCommError> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_reads {
            return Err(nb::Error::Other(MockCommError));
        }
        inner.release_scheduled();
        inner.read_queue.pop_front().ok_or(nb::Error::WouldBlock)
    }

    fn write_byte(&mut self, byte: u8) -> nb::Result<(), MockCommError> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_writes {
            return Err(nb::Error::Other(MockCommError));
        }
        inner.written.push(byte);
        if byte == b'\n' {
            let line = std::mem::take(&mut inner.line);
            let line = String::from_utf8_lossy(line.strip_suffix(b"\r").unwrap_or(&line[..])).into_owned();
            inner.on_line_written(&line);
        } else {
            inner.line.push(byte);
        }
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), MockCommError> {
        Ok(())
    }

    fn port_name(&self) -> Option<String> {
        self.inner.borrow().port.clone()
    }
}
