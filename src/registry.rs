// src/registry.rs

//! Keeps one live connection per pad and hands it out by name or port.

use crate::common::{PadError, PadSerial, PadTimer};
use crate::groups::{GroupKind, SensorGroup};
use crate::pad::SharedPad;
use std::collections::HashMap;

/// Normalises a port name so that `com6` and `COM6 ` compare equal.
/// Non-Windows paths are case sensitive and only trimmed.
pub fn canonical_port(port: &str) -> String {
    let trimmed = port.trim();
    let is_com = trimmed.len() > 3 && trimmed.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("com"));
    if is_com {
        trimmed.to_ascii_uppercase()
    } else {
        trimmed.to_string()
    }
}

/// Ways of naming a pad.
pub enum PadRef<'a, IF>
where
    IF: PadSerial + PadTimer,
{
    /// A registered name, falling back to a port.
    Name(&'a str),
    /// A port only.
    Port(&'a str),
    /// An existing handle, returned as is.
    Handle(&'a SharedPad<IF>),
}

/// Registry of open pads, keyed by canonical port.
pub struct PadRegistry<IF>
where
    IF: PadSerial + PadTimer,
{
    pads: HashMap<String, SharedPad<IF>>,
    names: HashMap<String, String>,
}

impl<IF> Default for PadRegistry<IF>
where
    IF: PadSerial + PadTimer,
{
    fn default() -> Self {
        PadRegistry {
            pads: HashMap::new(),
            names: HashMap::new(),
        }
    }
}

impl<IF> PadRegistry<IF>
where
    IF: PadSerial + PadTimer,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pads.is_empty()
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn resolve(&self, id: PadRef<'_, IF>) -> Option<SharedPad<IF>> {
        match id {
            PadRef::Handle(pad) => Some(pad.clone()),
            PadRef::Port(port) => self.pads.get(&canonical_port(port)).cloned(),
            PadRef::Name(name) => self
                .names
                .get(name)
                .and_then(|key| self.pads.get(key))
                .or_else(|| self.pads.get(&canonical_port(name)))
                .cloned(),
        }
    }

    /// Registers `pad` under `name`.
    ///
    /// If a pad is already registered on the same port, that one is kept, the
    /// name is pointed at it, and it is returned instead of `pad`.
    pub fn register(&mut self, name: &str, pad: SharedPad<IF>) -> SharedPad<IF> {
        let key = pad.port().unwrap_or_else(|| name.to_string());
        let pad = match self.pads.get(&key) {
            Some(existing) => {
                if !existing.ptr_eq(&pad) {
                    log::debug!("pad on {} already registered, reusing it for '{}'", key, name);
                }
                existing.clone()
            }
            None => {
                log::info!("registered pad '{}' on {}", name, key);
                self.pads.insert(key.clone(), pad.clone());
                pad
            }
        };
        self.names.insert(name.to_string(), key);
        pad
    }

    /// Removes the pad known by `id` (name or port) and every name pointing at it.
    pub fn unregister(&mut self, id: &str) -> Option<SharedPad<IF>> {
        let key = self
            .names
            .get(id)
            .cloned()
            .unwrap_or_else(|| canonical_port(id));
        let pad = self.pads.remove(&key)?;
        self.names.retain(|_, port| *port != key);
        log::info!("unregistered pad on {}", key);
        Some(pad)
    }

    /// Returns the pad known by `id`, or opens one with `open` and registers it
    /// under `id`.
    pub fn resolve_or_connect<F>(&mut self, id: &str, open: F) -> Result<SharedPad<IF>, PadError<IF::Error>>
    where
        F: FnOnce(&str) -> Result<SharedPad<IF>, PadError<IF::Error>>,
    {
        if let Some(pad) = self.resolve(PadRef::Name(id)) {
            return Ok(pad);
        }
        let pad = open(id)?;
        Ok(self.register(id, pad))
    }

    /// Opens a sensor group of `kind` on the pad known by `id`, connecting it
    /// first if needed.
    pub fn group<F>(
        &mut self,
        kind: GroupKind,
        id: &str,
        channels: Option<usize>,
        open: F,
    ) -> Result<SensorGroup<IF>, PadError<IF::Error>>
    where
        F: FnOnce(&str) -> Result<SharedPad<IF>, PadError<IF::Error>>,
    {
        let pad = self.resolve_or_connect(id, open)?;
        SensorGroup::new(&pad, kind, channels.unwrap_or(kind.default_channels()))
    }

    /// Like [`resolve`](Self::resolve) but an unknown pad is an error.
    pub fn get(&self, id: PadRef<'_, IF>) -> Result<SharedPad<IF>, PadError<IF::Error>> {
        let label = match &id {
            PadRef::Name(s) | PadRef::Port(s) => s.to_string(),
            PadRef::Handle(pad) => pad.port().unwrap_or_default(),
        };
        self.resolve(id).ok_or(PadError::UnknownPad(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PadConfig;
    use crate::pad::SyncPad;
    use crate::transport::mock::{MockCommError, MockInterface};
    use std::cell::Cell;

    fn open(port: &str) -> Result<SharedPad<MockInterface>, PadError<MockCommError>> {
        let config = PadConfig::new(port).with_check_awake(false);
        SharedPad::connect(MockInterface::new(), config)
    }

    #[test]
    fn test_canonical_port() {
        assert_eq!(canonical_port(" com6 "), "COM6");
        assert_eq!(canonical_port("COM12"), "COM12");
        assert_eq!(canonical_port("/dev/ttyACM0"), "/dev/ttyACM0");
        assert_eq!(canonical_port("com"), "com");
    }

    #[test]
    fn test_resolve_by_name_port_and_handle() {
        let mut registry = PadRegistry::new();
        let pad = registry.register("left", open("com6").unwrap());

        assert!(registry.resolve(PadRef::Name("left")).unwrap().ptr_eq(&pad));
        assert!(registry.resolve(PadRef::Name("COM6")).unwrap().ptr_eq(&pad));
        assert!(registry.resolve(PadRef::Port("com6")).unwrap().ptr_eq(&pad));
        assert!(registry.resolve(PadRef::Handle(&pad)).unwrap().ptr_eq(&pad));
        assert!(registry.resolve(PadRef::Port("left")).is_none());
        assert!(matches!(
            registry.get(PadRef::Name("right")),
            Err(PadError::UnknownPad(name)) if name == "right"
        ));
    }

    #[test]
    fn test_one_connection_per_port() {
        let mut registry = PadRegistry::new();
        let first = registry.register("a", open("COM6").unwrap());
        let second = registry.register("b", open("com6").unwrap());
        assert!(first.ptr_eq(&second));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names().count(), 2);
    }

    #[test]
    fn test_resolve_or_connect_opens_once() {
        let mut registry = PadRegistry::new();
        let opened = Cell::new(0);
        let open_counting = |port: &str| {
            opened.set(opened.get() + 1);
            open(port)
        };

        let a = registry.resolve_or_connect("COM6", &open_counting).unwrap();
        let b = registry.resolve_or_connect("com6", &open_counting).unwrap();
        assert!(a.ptr_eq(&b));
        assert_eq!(opened.get(), 1);
    }

    #[test]
    fn test_groups_from_registry_share_pad() {
        let mut registry = PadRegistry::new();
        let buttons = registry.group(GroupKind::Button, "COM6", None, open).unwrap();
        let photodiodes = registry
            .group(GroupKind::Photodiode, "COM6", None, |_: &str| -> Result<_, _> {
                panic!("pad should be reused")
            })
            .unwrap();
        assert!(buttons.is_same_device(&photodiodes));
        assert!(buttons.pad().ptr_eq(photodiodes.pad()));
        assert_eq!(buttons.channels(), 10);
    }

    #[test]
    fn test_unregister_removes_names() {
        let mut registry = PadRegistry::new();
        registry.register("left", open("COM6").unwrap());
        assert!(registry.unregister("left").is_some());
        assert!(registry.is_empty());
        assert!(registry.resolve(PadRef::Name("left")).is_none());
        assert!(registry.unregister("left").is_none());
    }

    #[test]
    fn test_pad_without_port_is_keyed_by_name() {
        let mut registry = PadRegistry::new();
        let pad: SharedPad<MockInterface> =
            SyncPad::new(MockInterface::new(), PadConfig::default()).into();
        registry.register("bench", pad);
        assert!(registry.resolve(PadRef::Name("bench")).is_some());
    }
}
