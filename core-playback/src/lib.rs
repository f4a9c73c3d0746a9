//! # Playback Module
//!
//! A unified video playback session over two very different backends.
//!
//! ## Overview
//!
//! This crate handles:
//! - The playback state machine ([`PlaybackSession`]) and its thread-safe
//!   command handle ([`SessionHandle`])
//! - Weakly held listeners ([`ObserverRegistry`], [`PlaybackListener`])
//! - Engine adapters for the observer-style platform framework and the
//!   delegate-style streaming SDK ([`engine`])
//! - System now-playing integration and remote commands ([`NowPlayingBridge`])
//! - Overlay state for player views ([`PresentationBinder`])
//!
//! Host services (the backends themselves, audio session, now-playing
//! center) are reached only through the contracts in `bridge-traits`.

pub mod control;
pub mod engine;
pub mod error;
pub mod listener;
pub mod now_playing;
pub mod presentation;
pub mod registry;
pub mod session;
pub mod state;

pub use control::{SeekCompletion, SessionHandle};
pub use engine::{
    EngineAdapter, EngineEvent, EngineEventSink, FrameworkAdapter, SdkAdapter, SeekPolicy,
};
pub use error::{PlaybackError, Result};
pub use listener::{EventBusListener, PlaybackListener};
pub use now_playing::NowPlayingBridge;
pub use presentation::{OverlayModel, PresentationBinder, PresentationView, UserAction};
pub use registry::ObserverRegistry;
pub use session::PlaybackSession;
pub use state::{MediaSource, PlaybackSessionId, PlaybackState, TelemetrySnapshot};
