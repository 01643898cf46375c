// src/lib.rs

//! Host-side engine for the TPad response pad.
//!
//! A [`SharedPad`] owns one serial connection: it frames and decodes the event
//! lines the pad streams, stamps them on the host clock, tracks the pad's mode,
//! and routes each event to the [`SensorGroup`]s attached to it. Groups of
//! different kinds share one pad and see only their own channel class.

pub mod common;
pub mod discovery;
pub mod groups;
pub mod pad;
pub mod registry;
pub mod transport;

// Re-export key types for convenience
pub use common::{Mode, PadConfig, PadError, RawMessage};
pub use discovery::{Discovery, GroupDescriptor, PadDescriptor};
pub use groups::{GroupKind, Listener, SensorGroup, ThresholdReading, TypedResponse};
pub use pad::{ModeLockGuard, SharedPad, SyncPad};
pub use registry::{PadRef, PadRegistry};
