//! Adapter for the observer-style platform media framework.

use super::{EngineAdapter, EngineEvent, EngineEventSink, SeekPolicy};
use crate::error::PlaybackError;
use crate::state::MediaSource;
use bridge_traits::{
    FrameworkPlayer, FrameworkSignal, ItemStatus, MediaFramework, RenderSurface, SignalSink,
};
use core_runtime::config::{EngineKind, PlaybackPolicy};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Drives a [`FrameworkPlayer`].
///
/// Time is sampled by the framework's own periodic observer, which is removed
/// for the duration of a seek and whenever sampling is switched off.
pub struct FrameworkAdapter {
    framework: Arc<dyn MediaFramework>,
    sample_interval: Duration,
    player: Option<Arc<dyn FrameworkPlayer>>,
    bridge: Option<Arc<FrameworkSignalBridge>>,
    sampling: bool,
    observing: bool,
    seeking: bool,
}

impl FrameworkAdapter {
    pub fn new(framework: Arc<dyn MediaFramework>, sample_interval: Duration) -> Self {
        Self {
            framework,
            sample_interval,
            player: None,
            bridge: None,
            sampling: false,
            observing: false,
            seeking: false,
        }
    }

    fn sync_time_observer(&mut self) {
        let wanted = self.sampling && !self.seeking;
        let Some(player) = &self.player else {
            self.observing = false;
            return;
        };
        if wanted == self.observing {
            return;
        }
        if wanted {
            player.add_periodic_time_observer(self.sample_interval);
        } else {
            player.remove_periodic_time_observer();
        }
        self.observing = wanted;
    }
}

impl EngineAdapter for FrameworkAdapter {
    fn kind(&self) -> EngineKind {
        EngineKind::Framework
    }

    fn seek_policy(&self) -> SeekPolicy {
        SeekPolicy::Reject
    }

    fn load(
        &mut self,
        source: &MediaSource,
        policy: &PlaybackPolicy,
        events: EngineEventSink,
    ) -> Result<RenderSurface, PlaybackError> {
        self.release();

        let bridge = Arc::new(FrameworkSignalBridge::new(events));
        let signals: Arc<dyn SignalSink<FrameworkSignal>> = bridge.clone();
        let player = self
            .framework
            .create_player(source.as_str(), signals)
            .map_err(PlaybackError::from)?;

        let surface = player.surface();
        self.player = Some(player);
        self.bridge = Some(bridge);
        self.apply_policy(policy);
        Ok(surface)
    }

    fn release(&mut self) {
        if let Some(bridge) = self.bridge.take() {
            bridge.deactivate();
        }
        if let Some(player) = self.player.take() {
            if self.observing {
                player.remove_periodic_time_observer();
            }
            player.pause();
            player.invalidate();
            debug!("Framework player released");
        }
        self.sampling = false;
        self.observing = false;
        self.seeking = false;
    }

    fn play(&mut self) {
        if let Some(player) = &self.player {
            player.play();
        }
    }

    fn pause(&mut self) {
        if let Some(player) = &self.player {
            player.pause();
        }
    }

    fn begin_seek(&mut self, to: f64, was_playing: bool) {
        let Some(player) = self.player.clone() else {
            return;
        };
        if was_playing {
            player.pause();
        }
        self.seeking = true;
        self.sync_time_observer();
        player.seek(to);
    }

    fn finish_seek(&mut self, was_playing: bool) {
        self.seeking = false;
        if was_playing {
            self.play();
        }
        self.sync_time_observer();
    }

    fn set_sampling(&mut self, enabled: bool) {
        self.sampling = enabled;
        self.sync_time_observer();
    }

    fn apply_policy(&mut self, policy: &PlaybackPolicy) {
        if let Some(player) = &self.player {
            player.set_volume(policy.volume);
            player.set_muted(policy.muted);
        }
    }

    fn set_surface_attached(&mut self, attached: bool) {
        if let Some(player) = &self.player {
            player.set_surface_attached(attached);
        }
    }

    fn current_time(&self) -> Option<f64> {
        self.player.as_ref().and_then(|p| p.current_time())
    }

    fn total_time(&self) -> Option<f64> {
        self.player.as_ref().and_then(|p| p.duration())
    }

    fn rate(&self) -> Option<f32> {
        self.player.as_ref().map(|p| p.rate())
    }
}

impl Drop for FrameworkAdapter {
    fn drop(&mut self) {
        self.release();
    }
}

// ============================================================================
// Signal Bridge
// ============================================================================

/// Translates framework property observations into [`EngineEvent`]s.
///
/// Frameworks re-deliver unchanged values, so status and keep-up changes are
/// compared against the last value seen before anything is forwarded.
struct FrameworkSignalBridge {
    events: EngineEventSink,
    active: AtomicBool,
    last: Mutex<Observed>,
}

struct Observed {
    status: ItemStatus,
    likely_to_keep_up: Option<bool>,
}

impl FrameworkSignalBridge {
    fn new(events: EngineEventSink) -> Self {
        Self {
            events,
            active: AtomicBool::new(true),
            last: Mutex::new(Observed {
                status: ItemStatus::Unknown,
                likely_to_keep_up: None,
            }),
        }
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    fn translate(&self, signal: FrameworkSignal) -> Option<EngineEvent> {
        match signal {
            FrameworkSignal::StatusChanged { old, new, error } => {
                let mut last = self.last.lock();
                if new == old || new == last.status {
                    trace!(status = ?new, "Ignoring repeated status");
                    return None;
                }
                last.status = new;
                match new {
                    ItemStatus::ReadyToPlay => Some(EngineEvent::Ready),
                    ItemStatus::Failed => Some(EngineEvent::Failed(PlaybackError::BackendFailure(
                        error.unwrap_or_else(|| "unknown framework error".to_string()),
                    ))),
                    ItemStatus::Unknown => None,
                }
            }
            FrameworkSignal::DurationChanged(duration) => Some(EngineEvent::Duration(duration)),
            FrameworkSignal::LoadedRangesChanged(ranges) => ranges
                .first()
                .map(|range| EngineEvent::BufferedTo(range.end())),
            FrameworkSignal::LikelyToKeepUpChanged { old, new } => {
                let mut last = self.last.lock();
                if new == old || last.likely_to_keep_up == Some(new) {
                    return None;
                }
                last.likely_to_keep_up = Some(new);
                Some(if new {
                    EngineEvent::LoadingEnded
                } else {
                    EngineEvent::LoadingBegan
                })
            }
            FrameworkSignal::PeriodicTime(seconds) => Some(EngineEvent::Time(seconds)),
            FrameworkSignal::SeekCompleted { finished } => {
                if !finished {
                    debug!("Framework seek ended without reaching target");
                }
                Some(EngineEvent::SeekCompleted)
            }
            FrameworkSignal::DidPlayToEnd => Some(EngineEvent::EndOfMedia),
            FrameworkSignal::PlaybackStalled => Some(EngineEvent::Stalled),
        }
    }
}

impl SignalSink<FrameworkSignal> for FrameworkSignalBridge {
    fn emit(&self, signal: FrameworkSignal) {
        if !self.active.load(Ordering::Acquire) {
            trace!(?signal, "Dropping signal from released framework player");
            return;
        }
        if let Some(event) = self.translate(signal) {
            self.events.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlMessage;
    use bridge_traits::TimeRange;
    use tokio::sync::mpsc;

    fn bridge() -> (FrameworkSignalBridge, mpsc::UnboundedReceiver<ControlMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (FrameworkSignalBridge::new(EngineEventSink::new(1, tx)), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ControlMessage>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let ControlMessage::Engine { event, .. } = message {
                events.push(event);
            }
        }
        events
    }

    #[test]
    fn test_repeated_ready_status_is_ignored() {
        let (bridge, mut rx) = bridge();
        let ready = FrameworkSignal::StatusChanged {
            old: ItemStatus::Unknown,
            new: ItemStatus::ReadyToPlay,
            error: None,
        };
        bridge.emit(ready.clone());
        bridge.emit(ready);
        bridge.emit(FrameworkSignal::StatusChanged {
            old: ItemStatus::ReadyToPlay,
            new: ItemStatus::ReadyToPlay,
            error: None,
        });

        assert_eq!(drain(&mut rx), vec![EngineEvent::Ready]);
    }

    #[test]
    fn test_failed_status_carries_error() {
        let (bridge, mut rx) = bridge();
        bridge.emit(FrameworkSignal::StatusChanged {
            old: ItemStatus::Unknown,
            new: ItemStatus::Failed,
            error: Some("unsupported codec".into()),
        });

        assert_eq!(
            drain(&mut rx),
            vec![EngineEvent::Failed(PlaybackError::BackendFailure(
                "unsupported codec".into()
            ))]
        );
    }

    #[test]
    fn test_keep_up_toggles_loading() {
        let (bridge, mut rx) = bridge();
        bridge.emit(FrameworkSignal::LikelyToKeepUpChanged {
            old: false,
            new: true,
        });
        bridge.emit(FrameworkSignal::LikelyToKeepUpChanged {
            old: true,
            new: true,
        });
        bridge.emit(FrameworkSignal::LikelyToKeepUpChanged {
            old: true,
            new: false,
        });

        assert_eq!(
            drain(&mut rx),
            vec![EngineEvent::LoadingEnded, EngineEvent::LoadingBegan]
        );
    }

    #[test]
    fn test_buffered_end_uses_first_range() {
        let (bridge, mut rx) = bridge();
        bridge.emit(FrameworkSignal::LoadedRangesChanged(vec![
            TimeRange::new(2.0, 8.0),
            TimeRange::new(30.0, 5.0),
        ]));
        bridge.emit(FrameworkSignal::LoadedRangesChanged(Vec::new()));

        assert_eq!(drain(&mut rx), vec![EngineEvent::BufferedTo(10.0)]);
    }

    #[test]
    fn test_deactivated_bridge_drops_signals() {
        let (bridge, mut rx) = bridge();
        bridge.deactivate();
        bridge.emit(FrameworkSignal::DidPlayToEnd);
        assert!(drain(&mut rx).is_empty());
    }
}
