// src/pad/mod.rs

mod shared;
mod sync_pad;

pub use shared::{ModeLockGuard, SharedPad};
pub use sync_pad::SyncPad;
