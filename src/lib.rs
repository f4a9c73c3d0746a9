//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-runtime`, `core-playback`). Host applications can
//! depend on `vpc-workspace` and enable `desktop-shims` to get the playback
//! session together with the desktop audio session and now-playing defaults,
//! without wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_playback as playback;
pub use core_runtime as runtime;
