//! Adapter for the delegate-style streaming SDK.

use super::{EngineAdapter, EngineEvent, EngineEventSink, SeekPolicy};
use crate::error::PlaybackError;
use crate::state::MediaSource;
use bridge_traits::{
    EnvironmentSignal, RenderSurface, SdkPlayer, SdkPlayerOptions, SdkSignal, SdkStatus,
    SignalSink, StreamingSdk,
};
use core_runtime::config::{EngineKind, PlaybackPolicy};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

/// Drives an [`SdkPlayer`].
///
/// The SDK has no time observer of its own, so position and duration are
/// polled by a tokio interval task while sampling is on. Without a running
/// tokio runtime no samples are produced.
pub struct SdkAdapter {
    sdk: Arc<dyn StreamingSdk>,
    options: SdkPlayerOptions,
    sample_interval: Duration,
    player: Option<Arc<dyn SdkPlayer>>,
    delegate: Option<Arc<SdkDelegate>>,
    events: Option<EngineEventSink>,
    ticker: Option<JoinHandle<()>>,
    sampling: bool,
    seeking: bool,
}

impl SdkAdapter {
    pub fn new(
        sdk: Arc<dyn StreamingSdk>,
        options: SdkPlayerOptions,
        sample_interval: Duration,
    ) -> Self {
        Self {
            sdk,
            options,
            sample_interval,
            player: None,
            delegate: None,
            events: None,
            ticker: None,
            sampling: false,
            seeking: false,
        }
    }

    fn sync_ticker(&mut self) {
        let wanted = self.sampling && !self.seeking && self.player.is_some();
        if !wanted {
            if let Some(ticker) = self.ticker.take() {
                ticker.abort();
            }
            return;
        }
        if self.ticker.is_some() {
            return;
        }
        let (Some(player), Some(events)) = (self.player.clone(), self.events.clone()) else {
            return;
        };
        match Handle::try_current() {
            Ok(handle) => {
                self.ticker = Some(handle.spawn(sample_loop(
                    player,
                    events,
                    self.sample_interval,
                )));
            }
            Err(_) => warn!("No tokio runtime available, SDK time sampling disabled"),
        }
    }
}

async fn sample_loop(player: Arc<dyn SdkPlayer>, events: EngineEventSink, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        if let Some(seconds) = player.current_time() {
            if !events.emit(EngineEvent::Time(seconds)) {
                break;
            }
        }
        if let Some(total) = player.total_duration() {
            if !events.emit(EngineEvent::Duration(Some(total))) {
                break;
            }
        }
    }
}

impl EngineAdapter for SdkAdapter {
    fn kind(&self) -> EngineKind {
        EngineKind::StreamingSdk
    }

    fn seek_policy(&self) -> SeekPolicy {
        SeekPolicy::QueueLatest
    }

    fn load(
        &mut self,
        source: &MediaSource,
        policy: &PlaybackPolicy,
        events: EngineEventSink,
    ) -> Result<RenderSurface, PlaybackError> {
        self.release();

        let delegate = Arc::new(SdkDelegate::new(events.clone()));
        let sink: Arc<dyn SignalSink<SdkSignal>> = delegate.clone();
        let player = self
            .sdk
            .create_player(source.as_str(), &self.options, sink)
            .map_err(|err| PlaybackError::SurfaceUnavailable(err.to_string()))?;

        let Some(view) = player.view() else {
            delegate.deactivate();
            player.stop();
            return Err(PlaybackError::SurfaceUnavailable(
                "streaming SDK returned no view".to_string(),
            ));
        };

        self.player = Some(player.clone());
        self.delegate = Some(delegate);
        self.events = Some(events);
        self.apply_policy(policy);

        // The SDK only starts connecting once asked to play.
        player.play();
        Ok(view)
    }

    fn release(&mut self) {
        self.sampling = false;
        self.seeking = false;
        self.sync_ticker();
        if let Some(delegate) = self.delegate.take() {
            delegate.deactivate();
        }
        self.events = None;
        if let Some(player) = self.player.take() {
            player.stop();
            debug!("SDK player released");
        }
    }

    fn play(&mut self) {
        if let Some(player) = &self.player {
            player.resume();
        }
    }

    fn pause(&mut self) {
        if let Some(player) = &self.player {
            player.pause();
        }
    }

    fn begin_seek(&mut self, to: f64, _was_playing: bool) {
        let Some(player) = self.player.clone() else {
            return;
        };
        self.seeking = true;
        self.sync_ticker();
        if let Some(events) = &self.events {
            events.emit(EngineEvent::LoadingBegan);
        }
        player.seek(to);
    }

    fn finish_seek(&mut self, _was_playing: bool) {
        // The SDK keeps its own play/pause state across a seek.
        self.seeking = false;
        self.sync_ticker();
    }

    fn set_sampling(&mut self, enabled: bool) {
        self.sampling = enabled;
        self.sync_ticker();
    }

    fn apply_policy(&mut self, policy: &PlaybackPolicy) {
        if let Some(player) = &self.player {
            player.set_volume(policy.volume);
            player.set_muted(policy.muted);
        }
    }

    fn set_surface_attached(&mut self, attached: bool) {
        if let Some(player) = &self.player {
            player.set_rendering_enabled(attached);
        }
    }

    fn current_time(&self) -> Option<f64> {
        self.player.as_ref().and_then(|p| p.current_time())
    }

    fn total_time(&self) -> Option<f64> {
        self.player.as_ref().and_then(|p| p.total_duration())
    }

    fn rate(&self) -> Option<f32> {
        self.player.as_ref().map(|p| p.play_speed())
    }
}

impl Drop for SdkAdapter {
    fn drop(&mut self) {
        self.release();
    }
}

// ============================================================================
// Delegate
// ============================================================================

/// Receives SDK delegate callbacks and forwards them as [`EngineEvent`]s.
struct SdkDelegate {
    events: EngineEventSink,
    active: AtomicBool,
}

impl SdkDelegate {
    fn new(events: EngineEventSink) -> Self {
        Self {
            events,
            active: AtomicBool::new(true),
        }
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    fn translate(signal: SdkSignal) -> Vec<EngineEvent> {
        match signal {
            SdkSignal::StatusChanged(status) => match status {
                SdkStatus::Preparing | SdkStatus::Caching => vec![EngineEvent::LoadingBegan],
                // Playing may arrive without a preceding Ready; the session
                // ignores the repeat.
                SdkStatus::Ready | SdkStatus::Playing => {
                    vec![EngineEvent::LoadingEnded, EngineEvent::Ready]
                }
                SdkStatus::Paused => vec![EngineEvent::PausedByEngine],
                SdkStatus::Error => vec![EngineEvent::Retry],
                SdkStatus::AutoReconnecting => {
                    vec![EngineEvent::LoadingBegan, EngineEvent::Reconnecting]
                }
                SdkStatus::Completed => vec![EngineEvent::LoadingEnded, EngineEvent::EndOfMedia],
                SdkStatus::Unknown | SdkStatus::Open | SdkStatus::Stopped => {
                    trace!(?status, "Ignoring SDK status");
                    Vec::new()
                }
            },
            SdkSignal::StoppedWithError(message) => {
                vec![EngineEvent::Failed(PlaybackError::BackendFailure(
                    message.unwrap_or_else(|| "streaming SDK stopped with error".to_string()),
                ))]
            }
            SdkSignal::LoadedTimeRange(seconds) => vec![EngineEvent::BufferedTo(seconds)],
            SdkSignal::SeekCompleted { completed } => {
                if !completed {
                    debug!("SDK seek ended without reaching target");
                }
                vec![EngineEvent::SeekCompleted, EngineEvent::LoadingEnded]
            }
            SdkSignal::WillBeginBackgroundTask => {
                vec![EngineEvent::Environment(EnvironmentSignal::EnteredBackground)]
            }
            SdkSignal::WillEndBackgroundTask => {
                vec![EngineEvent::Environment(EnvironmentSignal::WillEnterForeground)]
            }
        }
    }
}

impl SignalSink<SdkSignal> for SdkDelegate {
    fn emit(&self, signal: SdkSignal) {
        if !self.active.load(Ordering::Acquire) {
            trace!(?signal, "Dropping callback from released SDK player");
            return;
        }
        for event in Self::translate(signal) {
            self.events.emit(event);
        }
    }
}
