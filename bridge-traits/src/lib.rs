//! # Host Bridge Traits
//!
//! Contracts between the playback core and the native world it drives.
//!
//! ## Overview
//!
//! The core never links against a media framework, a streaming SDK or an OS
//! audio API directly. Each of those is described here as a trait which the
//! host implements (or which `bridge-desktop` implements with defaults), so the
//! state machine in `core-playback` can be exercised on any platform and with
//! fake backends in tests.
//!
//! ## Traits
//!
//! ### Playback Engines
//! - [`MediaFramework`](framework::MediaFramework) / [`FrameworkPlayer`](framework::FrameworkPlayer) -
//!   property-observation driven platform framework
//! - [`StreamingSdk`](sdk::StreamingSdk) / [`SdkPlayer`](sdk::SdkPlayer) -
//!   delegate driven third-party streaming SDK
//! - [`SignalSink`](signal::SignalSink) - callback sink both engines report into
//!
//! ### Platform Integration
//! - [`AudioSession`](audio::AudioSession) - process audio category and activation
//! - [`NowPlayingCenter`](now_playing::NowPlayingCenter) - lock-screen now-playing info
//! - [`RemoteCommandCenter`](now_playing::RemoteCommandCenter) - remote play/pause commands
//! - [`EnvironmentSignal`](environment::EnvironmentSignal) - route, interruption and lifecycle notifications
//!
//! ### Utilities
//! - [`RenderSurface`](surface::RenderSurface) - opaque view handle returned to the host
//! - [`LoggerSink`](logging::LoggerSink) - forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Defaults for audio session and now-playing |
//! | iOS      | host app            | 📋 Planned |
//! | Android  | host app            | 📋 Planned |
//!
//! Engines are always supplied by the host; there is no desktop default for a
//! media framework or a streaming SDK.
//!
//! ## Threading
//!
//! Engines call their [`SignalSink`](signal::SignalSink) from arbitrary threads.
//! All traits therefore require `Send + Sync`, and sinks must only enqueue.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors and keep the original description in the
//! message.

pub mod audio;
pub mod environment;
pub mod error;
pub mod framework;
pub mod logging;
pub mod now_playing;
pub mod sdk;
pub mod signal;
pub mod surface;

pub use error::BridgeError;

// Re-export commonly used types
pub use audio::{AudioCategory, AudioSession, DeactivationOptions};
pub use environment::{EnvironmentSignal, RouteChangeReason};
pub use framework::{FrameworkPlayer, FrameworkSignal, ItemStatus, MediaFramework, TimeRange};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use now_playing::{
    MediaMetadata, MediaType, NowPlayingCenter, NowPlayingInfo, RemoteCommand,
    RemoteCommandCenter, RemoteCommandStatus,
};
pub use sdk::{SdkPlayer, SdkPlayerOptions, SdkSignal, SdkStatus, StreamingSdk};
pub use signal::SignalSink;
pub use surface::{RenderSurface, SurfaceId};
