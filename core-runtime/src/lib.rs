//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the video player core:
//! - Logging and tracing infrastructure
//! - Player configuration and playback policy
//! - Event bus for hosts that consume playback events as a stream
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that `core-playback` depends on.
//! It establishes the logging conventions, the fail-fast configuration
//! builder, and the serializable event vocabulary shared with hosts.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
