//! Platform media framework contract.
//!
//! Models a property-observation driven engine: the host creates a player for a
//! media item and then reports changes of observed properties (item status,
//! duration, loaded ranges, likely-to-keep-up) together with notifications
//! (played to end, stalled), periodic time callbacks and seek completions as
//! [`FrameworkSignal`]s.
//!
//! Property observation reports both the previous and the new value. Some
//! framework versions deliver the same status change twice; consumers compare
//! `old` and `new` rather than trusting that every delivery is a transition.

use crate::{error::Result, signal::SignalSink, surface::RenderSurface};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Status of the current media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    Unknown,
    ReadyToPlay,
    Failed,
}

/// A loaded (buffered) time range in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub duration: f64,
}

impl TimeRange {
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, duration }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Asynchronous signal reported by a framework player.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameworkSignal {
    /// The item's `status` property changed.
    StatusChanged {
        old: ItemStatus,
        new: ItemStatus,
        /// Error description when `new` is [`ItemStatus::Failed`].
        error: Option<String>,
    },
    /// The item's `duration` property changed. `None` while indefinite.
    DurationChanged(Option<f64>),
    /// The item's loaded ranges changed. The first range is the one around the
    /// playhead.
    LoadedRangesChanged(Vec<TimeRange>),
    /// The item's `playbackLikelyToKeepUp` property changed.
    LikelyToKeepUpChanged { old: bool, new: bool },
    /// Periodic time observer fired.
    PeriodicTime(f64),
    /// A seek started with [`FrameworkPlayer::seek`] completed.
    SeekCompleted { finished: bool },
    /// The item played to its end.
    DidPlayToEnd,
    /// Playback stalled because the network could not keep up.
    PlaybackStalled,
}

/// Factory for framework players.
#[cfg_attr(test, mockall::automock)]
pub trait MediaFramework: Send + Sync {
    /// Create a player with a fresh item for `source`.
    ///
    /// The player must pause at the end of the item rather than advance, and
    /// must report all observed properties to `signals` until
    /// [`FrameworkPlayer::invalidate`] is called.
    fn create_player(
        &self,
        source: &str,
        signals: Arc<dyn SignalSink<FrameworkSignal>>,
    ) -> Result<Arc<dyn FrameworkPlayer>>;
}

/// A framework player bound to a single media item.
pub trait FrameworkPlayer: Send + Sync {
    /// Layer/view rendering the item.
    fn surface(&self) -> RenderSurface;

    fn play(&self);

    fn pause(&self);

    fn set_volume(&self, volume: f32);

    fn set_muted(&self, muted: bool);

    /// Seek the item. Completion is reported as [`FrameworkSignal::SeekCompleted`].
    fn seek(&self, seconds: f64);

    /// Install the periodic time observer. Replaces any existing observer.
    fn add_periodic_time_observer(&self, interval: Duration);

    fn remove_periodic_time_observer(&self);

    /// Attach or detach the player from its rendering layer. A detached player
    /// keeps decoding audio but stops rendering video.
    fn set_surface_attached(&self, attached: bool);

    fn status(&self) -> ItemStatus;

    /// Current item time in seconds. `None` when indefinite.
    fn current_time(&self) -> Option<f64>;

    /// Item duration in seconds. `None` when indefinite.
    fn duration(&self) -> Option<f64>;

    fn rate(&self) -> f32;

    /// Remove all property observers and drop the current item. No further
    /// signals may be emitted afterwards.
    fn invalidate(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_end() {
        let range = TimeRange::new(2.5, 10.0);
        assert_eq!(range.end(), 12.5);
    }

    #[test]
    fn test_factory_failure_propagates() {
        let mut framework = MockMediaFramework::new();
        framework.expect_create_player().returning(|source, _| {
            Err(crate::error::BridgeError::SourceRejected(source.to_string()))
        });

        struct Discard;
        impl SignalSink<FrameworkSignal> for Discard {
            fn emit(&self, _signal: FrameworkSignal) {}
        }

        let result = framework.create_player("bad://source", Arc::new(Discard));
        assert!(matches!(
            result,
            Err(crate::error::BridgeError::SourceRejected(ref s)) if s == "bad://source"
        ));
    }
}
