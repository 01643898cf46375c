// src/groups/mod.rs

//! Sensor groups: typed, per-class views onto a pad.

mod calibration;
mod kind;
mod node;
mod response;
mod sensor_group;

pub use kind::GroupKind;
pub use node::GroupNode;
pub use response::{Listener, LoggingListener, SharedListener, ThresholdReading, TypedResponse};
pub use sensor_group::SensorGroup;
