//! # Engine Adapters
//!
//! The seam between a [`PlaybackSession`](crate::PlaybackSession) and a
//! concrete playback backend.
//!
//! ## Overview
//!
//! An adapter owns one backend player at a time. Verbs flow from the session
//! into the adapter as direct calls; backend milestones flow back as
//! [`EngineEvent`]s through an [`EngineEventSink`], which marshals them onto
//! the session's control inbox. Whatever thread the backend calls back on,
//! the session only sees events when it drains its inbox.
//!
//! Two adapters ship with the crate:
//!
//! - [`FrameworkAdapter`]: observer-style platform framework. Rejects a second
//!   concurrent seek.
//! - [`SdkAdapter`]: delegate-style streaming SDK. Queues the latest seek.

mod framework;
mod sdk;

pub use framework::FrameworkAdapter;
pub use sdk::SdkAdapter;

use crate::control::ControlMessage;
use crate::error::PlaybackError;
use crate::state::MediaSource;
use bridge_traits::{EnvironmentSignal, RenderSurface};
use core_runtime::config::{EngineKind, PlaybackPolicy};
use tokio::sync::mpsc::UnboundedSender;

/// Backend milestone normalized across adapters.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The source is playable.
    Ready,
    /// Fatal failure of the current source.
    Failed(PlaybackError),
    LoadingBegan,
    LoadingEnded,
    /// Seconds of media buffered from the start.
    BufferedTo(f64),
    Duration(Option<f64>),
    /// Periodic playback position sample.
    Time(f64),
    SeekCompleted,
    EndOfMedia,
    /// Playback stalled while the backend still wants to play.
    Stalled,
    /// The backend hit a recoverable error and should be told to play again.
    Retry,
    /// The backend paused on its own.
    PausedByEngine,
    /// The backend is reconnecting a dropped stream.
    Reconnecting,
    /// Lifecycle notification raised by the backend itself.
    Environment(EnvironmentSignal),
}

/// How an adapter treats a seek requested while another is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekPolicy {
    /// Complete the new request immediately without seeking.
    Reject,
    /// Keep only the most recent request and run it after the current one.
    QueueLatest,
}

/// Delivers [`EngineEvent`]s to the owning session.
///
/// Each sink is stamped with the generation of the backend it was created
/// for. Events from a backend that has since been torn down are discarded by
/// the session.
#[derive(Debug, Clone)]
pub struct EngineEventSink {
    epoch: u64,
    tx: UnboundedSender<ControlMessage>,
}

impl EngineEventSink {
    pub(crate) fn new(epoch: u64, tx: UnboundedSender<ControlMessage>) -> Self {
        Self { epoch, tx }
    }

    /// Queues `event` for the session. Returns `false` once the session is
    /// gone.
    pub fn emit(&self, event: EngineEvent) -> bool {
        self.tx
            .send(ControlMessage::Engine {
                epoch: self.epoch,
                event,
            })
            .is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Backend-specific half of a playback session.
///
/// Calls never fail at the verb level: problems after `load` are reported as
/// [`EngineEvent::Failed`]. Every method must tolerate being called with no
/// backend loaded.
pub trait EngineAdapter: Send {
    fn kind(&self) -> EngineKind;

    fn seek_policy(&self) -> SeekPolicy;

    /// Releases any current backend, builds a new one for `source` and starts
    /// probing readiness.
    fn load(
        &mut self,
        source: &MediaSource,
        policy: &PlaybackPolicy,
        events: EngineEventSink,
    ) -> Result<RenderSurface, PlaybackError>;

    /// Stops sampling, detaches observers and drops the backend.
    fn release(&mut self);

    fn play(&mut self);

    fn pause(&mut self);

    /// Suspends sampling and starts seeking. `was_playing` tells the adapter
    /// whether playback must resume afterwards.
    fn begin_seek(&mut self, to: f64, was_playing: bool);

    /// Called once the backend reported [`EngineEvent::SeekCompleted`].
    fn finish_seek(&mut self, was_playing: bool);

    /// Turns periodic [`EngineEvent::Time`] sampling on or off.
    fn set_sampling(&mut self, enabled: bool);

    fn apply_policy(&mut self, policy: &PlaybackPolicy);

    fn set_surface_attached(&mut self, attached: bool);

    fn current_time(&self) -> Option<f64>;

    fn total_time(&self) -> Option<f64>;

    fn rate(&self) -> Option<f32>;
}
