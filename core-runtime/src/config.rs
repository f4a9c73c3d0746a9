//! # Player Configuration Module
//!
//! Provides configuration management for the video player core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`PlayerConfig`] holding the playback engine binding, the host bridges and
//! the initial [`PlaybackPolicy`]. It enforces fail-fast validation so that a
//! session is never constructed against a missing engine or an out-of-range
//! policy.
//!
//! ## Required Dependencies
//!
//! - The engine selected with [`PlayerConfigBuilder::engine`]:
//!   `MediaFramework` for [`EngineKind::Framework`], `StreamingSdk` for
//!   [`EngineKind::StreamingSdk`]
//! - `AudioSession` - process audio category and activation
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `NowPlayingCenter` - lock-screen now-playing info
//! - `RemoteCommandCenter` - remote play/pause commands
//!
//! When the `desktop-shims` feature is enabled, desktop defaults for the audio
//! session, now-playing center and remote command center are injected if not
//! provided. Engines never have a default.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{EngineKind, PlayerConfig};
//! use std::sync::Arc;
//!
//! let config = PlayerConfig::builder()
//!     .engine(EngineKind::Framework)
//!     .media_framework(Arc::new(MyFramework))
//!     .volume(0.8)
//!     .looping(true)
//!     .build()?;
//! ```
//!
//! ## Policy from JSON
//!
//! [`PlaybackPolicy`] derives `serde` with per-field defaults so a host can
//! persist the user's choices and feed them back in:
//!
//! ```
//! use core_runtime::config::PlaybackPolicy;
//!
//! let policy: PlaybackPolicy = serde_json::from_str(r#"{"volume":0.5,"loop":true}"#).unwrap();
//! assert!(policy.looping);
//! assert!(policy.auto_play);
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    AudioSession, MediaFramework, NowPlayingCenter, RemoteCommandCenter, SdkPlayerOptions,
    StreamingSdk,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default periodic time sampling interval (10 Hz).
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Default sampling interval for the streaming SDK, whose clock only advances
/// in whole seconds.
pub const DEFAULT_SDK_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

const MIN_SAMPLE_INTERVAL: Duration = Duration::from_millis(10);
const MAX_SAMPLE_INTERVAL: Duration = Duration::from_secs(10);

/// Which native engine drives playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineKind {
    /// Platform media framework (property observation).
    Framework,
    /// Third-party streaming SDK (delegate callbacks).
    StreamingSdk,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Framework => "framework",
            EngineKind::StreamingSdk => "streaming_sdk",
        }
    }
}

/// User-facing playback policy.
///
/// Survives `stop` → `prepare` cycles and is re-applied to every new backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackPolicy {
    /// Output volume in `[0, 1]`.
    #[serde(default = "default_volume")]
    pub volume: f32,

    #[serde(default)]
    pub muted: bool,

    /// Restart from the beginning when the end of media is reached.
    #[serde(default, rename = "loop")]
    pub looping: bool,

    /// Keep playing audio while the app is in the background. When disabled,
    /// backgrounding pauses playback and detaches the surface.
    #[serde(default)]
    pub background_playback: bool,

    /// Start playing as soon as the source is ready.
    #[serde(default = "default_auto_play")]
    pub auto_play: bool,
}

fn default_volume() -> f32 {
    1.0
}

fn default_auto_play() -> bool {
    true
}

impl Default for PlaybackPolicy {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            muted: false,
            looping: false,
            background_playback: false,
            auto_play: default_auto_play(),
        }
    }
}

impl PlaybackPolicy {
    /// Validates the policy.
    pub fn validate(&self) -> Result<()> {
        if !self.volume.is_finite() || !(0.0..=1.0).contains(&self.volume) {
            return Err(Error::Config(format!(
                "Volume must be between 0.0 and 1.0, got {}",
                self.volume
            )));
        }
        Ok(())
    }
}

/// Configuration for a playback session.
///
/// Use [`PlayerConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct PlayerConfig {
    pub engine: EngineKind,

    /// Initial policy for new sessions
    pub policy: PlaybackPolicy,

    /// Periodic time sampling interval for the framework engine
    pub sample_interval: Duration,

    /// Time sampling interval for the streaming SDK engine
    pub sdk_sample_interval: Duration,

    /// Options passed to the SDK when constructing players
    pub sdk_options: SdkPlayerOptions,

    pub media_framework: Option<Arc<dyn MediaFramework>>,

    pub streaming_sdk: Option<Arc<dyn StreamingSdk>>,

    /// Process audio session (required)
    pub audio_session: Arc<dyn AudioSession>,

    pub now_playing_center: Option<Arc<dyn NowPlayingCenter>>,

    pub remote_commands: Option<Arc<dyn RemoteCommandCenter>>,
}

impl std::fmt::Debug for PlayerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerConfig")
            .field("engine", &self.engine)
            .field("policy", &self.policy)
            .field("sample_interval", &self.sample_interval)
            .field("sdk_sample_interval", &self.sdk_sample_interval)
            .field("sdk_options", &self.sdk_options)
            .field(
                "media_framework",
                &self.media_framework.as_ref().map(|_| "MediaFramework { ... }"),
            )
            .field(
                "streaming_sdk",
                &self.streaming_sdk.as_ref().map(|_| "StreamingSdk { ... }"),
            )
            .field("audio_session", &"AudioSession { ... }")
            .field(
                "now_playing_center",
                &self
                    .now_playing_center
                    .as_ref()
                    .map(|_| "NowPlayingCenter { ... }"),
            )
            .field(
                "remote_commands",
                &self
                    .remote_commands
                    .as_ref()
                    .map(|_| "RemoteCommandCenter { ... }"),
            )
            .finish()
    }
}

impl PlayerConfig {
    /// Creates a new builder for constructing a `PlayerConfig`.
    pub fn builder() -> PlayerConfigBuilder {
        PlayerConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The policy is in range
    /// - Sampling intervals are between 10ms and 10s
    /// - The selected engine has a backend
    pub fn validate(&self) -> Result<()> {
        self.policy.validate()?;

        for (name, interval) in [
            ("Sample interval", self.sample_interval),
            ("SDK sample interval", self.sdk_sample_interval),
        ] {
            if interval < MIN_SAMPLE_INTERVAL {
                return Err(Error::Config(format!(
                    "{} must be at least {}ms",
                    name,
                    MIN_SAMPLE_INTERVAL.as_millis()
                )));
            }
            if interval > MAX_SAMPLE_INTERVAL {
                return Err(Error::Config(format!(
                    "{} exceeds maximum of {}s",
                    name,
                    MAX_SAMPLE_INTERVAL.as_secs()
                )));
            }
        }

        match self.engine {
            EngineKind::Framework if self.media_framework.is_none() => {
                Err(engine_missing_error("MediaFramework", self.engine))
            }
            EngineKind::StreamingSdk if self.streaming_sdk.is_none() => {
                Err(engine_missing_error("StreamingSdk", self.engine))
            }
            _ => Ok(()),
        }
    }
}

fn engine_missing_error(capability: &str, engine: EngineKind) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "Engine '{}' selected but no {} binding was provided. \
             Inject the host's native binding with the matching builder method.",
            engine.as_str(),
            capability
        ),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn audio_session_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "AudioSession".to_string(),
        message: "AudioSession implementation is required to configure playback audio. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default DesktopAudioSession. \
                 Mobile: inject the platform audio session binding."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_audio_session() -> Result<Arc<dyn AudioSession>> {
    use bridge_desktop::DesktopAudioSession;

    let session: Arc<dyn AudioSession> = Arc::new(DesktopAudioSession::new());
    Ok(session)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_audio_session() -> Result<Arc<dyn AudioSession>> {
    Err(audio_session_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_now_playing() -> Option<Arc<dyn NowPlayingCenter>> {
    Some(Arc::new(bridge_desktop::InMemoryNowPlayingCenter::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_now_playing() -> Option<Arc<dyn NowPlayingCenter>> {
    None
}

#[cfg(feature = "desktop-shims")]
fn provide_default_remote_commands() -> Option<Arc<dyn RemoteCommandCenter>> {
    Some(Arc::new(bridge_desktop::DesktopRemoteCommandCenter::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_remote_commands() -> Option<Arc<dyn RemoteCommandCenter>> {
    None
}

/// Builder for constructing [`PlayerConfig`] instances.
///
/// Call [`build()`](PlayerConfigBuilder::build) to validate and create the
/// final config.
#[derive(Default)]
pub struct PlayerConfigBuilder {
    engine: Option<EngineKind>,
    policy: PlaybackPolicy,
    sample_interval: Option<Duration>,
    sdk_sample_interval: Option<Duration>,
    sdk_options: Option<SdkPlayerOptions>,
    media_framework: Option<Arc<dyn MediaFramework>>,
    streaming_sdk: Option<Arc<dyn StreamingSdk>>,
    audio_session: Option<Arc<dyn AudioSession>>,
    now_playing_center: Option<Arc<dyn NowPlayingCenter>>,
    remote_commands: Option<Arc<dyn RemoteCommandCenter>>,
}

impl PlayerConfigBuilder {
    /// Selects the engine.
    ///
    /// When not set, the framework engine is used if a `MediaFramework` was
    /// provided, otherwise the streaming SDK.
    pub fn engine(mut self, engine: EngineKind) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn media_framework(mut self, framework: Arc<dyn MediaFramework>) -> Self {
        self.media_framework = Some(framework);
        self
    }

    pub fn streaming_sdk(mut self, sdk: Arc<dyn StreamingSdk>) -> Self {
        self.streaming_sdk = Some(sdk);
        self
    }

    pub fn audio_session(mut self, session: Arc<dyn AudioSession>) -> Self {
        self.audio_session = Some(session);
        self
    }

    pub fn now_playing_center(mut self, center: Arc<dyn NowPlayingCenter>) -> Self {
        self.now_playing_center = Some(center);
        self
    }

    pub fn remote_commands(mut self, commands: Arc<dyn RemoteCommandCenter>) -> Self {
        self.remote_commands = Some(commands);
        self
    }

    /// Sets the whole policy at once.
    pub fn policy(mut self, policy: PlaybackPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Default: 1.0
    pub fn volume(mut self, volume: f32) -> Self {
        self.policy.volume = volume;
        self
    }

    pub fn muted(mut self, muted: bool) -> Self {
        self.policy.muted = muted;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.policy.looping = looping;
        self
    }

    pub fn background_playback(mut self, enabled: bool) -> Self {
        self.policy.background_playback = enabled;
        self
    }

    /// Default: true
    pub fn auto_play(mut self, enabled: bool) -> Self {
        self.policy.auto_play = enabled;
        self
    }

    /// Default: 100ms
    pub fn sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = Some(interval);
        self
    }

    /// Default: 1s
    pub fn sdk_sample_interval(mut self, interval: Duration) -> Self {
        self.sdk_sample_interval = Some(interval);
        self
    }

    pub fn sdk_options(mut self, options: SdkPlayerOptions) -> Self {
        self.sdk_options = Some(options);
        self
    }

    /// Builds the final `PlayerConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(PlayerConfig)` on success, or an error if:
    /// - The selected engine has no backend
    /// - No audio session is available
    /// - Policy or intervals are out of range
    pub fn build(self) -> Result<PlayerConfig> {
        let engine = match self.engine {
            Some(engine) => engine,
            None if self.media_framework.is_some() => EngineKind::Framework,
            None if self.streaming_sdk.is_some() => EngineKind::StreamingSdk,
            None => {
                return Err(Error::Config(
                    "No playback engine provided. Use .media_framework() or .streaming_sdk()."
                        .to_string(),
                ))
            }
        };

        let audio_session = match self.audio_session {
            Some(session) => session,
            None => provide_default_audio_session()?,
        };

        let config = PlayerConfig {
            engine,
            policy: self.policy,
            sample_interval: self.sample_interval.unwrap_or(DEFAULT_SAMPLE_INTERVAL),
            sdk_sample_interval: self
                .sdk_sample_interval
                .unwrap_or(DEFAULT_SDK_SAMPLE_INTERVAL),
            sdk_options: self.sdk_options.unwrap_or_default(),
            media_framework: self.media_framework,
            streaming_sdk: self.streaming_sdk,
            audio_session,
            now_playing_center: self
                .now_playing_center
                .or_else(provide_default_now_playing),
            remote_commands: self
                .remote_commands
                .or_else(provide_default_remote_commands),
        };

        config.validate()?;

        Ok(config)
    }
}
