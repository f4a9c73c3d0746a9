//! # Desktop Bridge Implementations
//!
//! Default implementations of the host integration traits for desktop
//! platforms (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! Desktop hosts have no process-wide audio session and no lock screen, so
//! these implementations keep the requested state in memory and log every
//! change through `tracing`:
//! - `AudioSession` as [`DesktopAudioSession`]
//! - `NowPlayingCenter` as [`InMemoryNowPlayingCenter`]
//! - `RemoteCommandCenter` as [`DesktopRemoteCommandCenter`]
//!
//! Media engines are not provided here; hosts inject their own framework or
//! SDK binding.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DesktopAudioSession, InMemoryNowPlayingCenter};
//! use std::sync::Arc;
//!
//! let audio = Arc::new(DesktopAudioSession::new());
//! let now_playing = Arc::new(InMemoryNowPlayingCenter::new());
//! // Pass into PlayerConfig::builder()
//! ```

mod audio;
mod now_playing;

pub use audio::DesktopAudioSession;
pub use now_playing::{DesktopRemoteCommandCenter, InMemoryNowPlayingCenter};
