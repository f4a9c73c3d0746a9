//! Third-party streaming SDK contract.
//!
//! Models a delegate driven engine: the SDK reports coarse player status
//! changes, buffered duration, seek completion and background-task transitions
//! through a delegate. Unlike the platform framework it has no periodic time
//! callback, so the core samples time itself.

use crate::{error::Result, signal::SignalSink, surface::RenderSurface};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Player status reported by the SDK delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SdkStatus {
    /// Initial status; never re-entered.
    Unknown,
    Preparing,
    Ready,
    /// Connection about to open.
    Open,
    Caching,
    Playing,
    Paused,
    /// Playback ended or was stopped manually.
    Stopped,
    /// Recoverable error; the SDK expects `play` to be re-issued.
    Error,
    AutoReconnecting,
    /// On-demand playback completed.
    Completed,
}

impl SdkStatus {
    /// Statuses in which the SDK accepts a seek request.
    pub fn accepts_seek(&self) -> bool {
        matches!(self, SdkStatus::Caching | SdkStatus::Playing | SdkStatus::Paused)
    }
}

/// Delegate callback delivered by the SDK.
#[derive(Debug, Clone, PartialEq)]
pub enum SdkSignal {
    StatusChanged(SdkStatus),
    /// Fatal error; the player stopped.
    StoppedWithError(Option<String>),
    /// Buffered duration in seconds, measured from the start of the media.
    LoadedTimeRange(f64),
    SeekCompleted { completed: bool },
    WillBeginBackgroundTask,
    WillEndBackgroundTask,
}

/// Options used when constructing an SDK player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdkPlayerOptions {
    /// Connection timeout.
    pub timeout: Duration,
    /// Let the SDK keep its audio running while the app is in the background.
    pub background_play_enabled: bool,
}

impl Default for SdkPlayerOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            background_play_enabled: true,
        }
    }
}

/// Factory for SDK players.
#[cfg_attr(test, mockall::automock)]
pub trait StreamingSdk: Send + Sync {
    /// Construct a player for `source`, registering `delegate` for callbacks.
    fn create_player(
        &self,
        source: &str,
        options: &SdkPlayerOptions,
        delegate: Arc<dyn SignalSink<SdkSignal>>,
    ) -> Result<Arc<dyn SdkPlayer>>;
}

/// A streaming SDK player.
pub trait SdkPlayer: Send + Sync {
    /// Rendering view. `None` when the SDK failed to create one.
    fn view(&self) -> Option<RenderSurface>;

    /// Start playback from the beginning of the stream.
    fn play(&self);

    /// Resume after a pause.
    fn resume(&self);

    fn pause(&self);

    /// Stop playback and release network resources. Idempotent.
    fn stop(&self);

    /// Seek. Completion is reported as [`SdkSignal::SeekCompleted`].
    fn seek(&self, seconds: f64);

    fn set_volume(&self, volume: f32);

    fn set_muted(&self, muted: bool);

    /// Toggle video rendering; audio continues while disabled.
    fn set_rendering_enabled(&self, enabled: bool);

    fn status(&self) -> SdkStatus;

    fn current_time(&self) -> Option<f64>;

    fn total_duration(&self) -> Option<f64>;

    fn play_speed(&self) -> f32;
}
