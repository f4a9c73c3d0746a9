//! Shared fakes for the core-playback integration suites.
//!
//! The fake backends record every call and let a test inject the signals a
//! real framework or SDK would deliver from its own threads.

#![allow(dead_code)]

use bridge_desktop::{DesktopAudioSession, DesktopRemoteCommandCenter};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    BridgeError, FrameworkPlayer, FrameworkSignal, ItemStatus, MediaFramework, RenderSurface,
    SdkPlayer, SdkPlayerOptions, SdkSignal, SdkStatus, SignalSink, StreamingSdk,
};
use core_playback::{PlaybackListener, PlaybackError, PlaybackSession};
use core_runtime::config::{PlaybackPolicy, PlayerConfig};
use core_runtime::events::PlayerEvent;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Recording Listener
// ============================================================================

/// Records every callback as a [`PlayerEvent`].
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<PlayerEvent>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<PlayerEvent> {
        self.events.lock().clone()
    }

    pub fn states(&self) -> Vec<PlayerEvent> {
        self.events()
            .into_iter()
            .filter(PlayerEvent::is_state_change)
            .collect()
    }

    pub fn count(&self, event: &PlayerEvent) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn push(&self, event: PlayerEvent) {
        self.events.lock().push(event);
    }
}

impl PlaybackListener for RecordingListener {
    fn on_playing(&self) {
        self.push(PlayerEvent::Playing);
    }

    fn on_paused(&self) {
        self.push(PlayerEvent::Paused);
    }

    fn on_stopped(&self) {
        self.push(PlayerEvent::Stopped);
    }

    fn on_finished(&self) {
        self.push(PlayerEvent::Finished);
    }

    fn on_error(&self, error: &PlaybackError) {
        self.push(PlayerEvent::Failed {
            message: error.to_string(),
        });
    }

    fn on_loading_begin(&self) {
        self.push(PlayerEvent::LoadingBegan);
    }

    fn on_loading_end(&self) {
        self.push(PlayerEvent::LoadingEnded);
    }

    fn on_buffer_progress(&self, progress: f64) {
        self.push(PlayerEvent::BufferProgress { progress });
    }

    fn on_total_time(&self, seconds: f64) {
        self.push(PlayerEvent::TotalTime { seconds });
    }

    fn on_current_time(&self, seconds: f64) {
        self.push(PlayerEvent::CurrentTime { seconds });
    }

    fn on_seek_finished(&self) {
        self.push(PlayerEvent::SeekFinished);
    }

    fn on_ready(&self) {
        self.push(PlayerEvent::Ready);
    }
}

// ============================================================================
// Fake Framework
// ============================================================================

pub struct FakeFrameworkPlayer {
    calls: Mutex<Vec<String>>,
    surface: RenderSurface,
    observing: AtomicBool,
    attached: AtomicBool,
    invalidated: AtomicBool,
    duration: Mutex<Option<f64>>,
    current_time: Mutex<Option<f64>>,
    rate: Mutex<f32>,
}

impl FakeFrameworkPlayer {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            surface: RenderSurface::new("framework-layer"),
            observing: AtomicBool::new(false),
            attached: AtomicBool::new(true),
            invalidated: AtomicBool::new(false),
            duration: Mutex::new(None),
            current_time: Mutex::new(None),
            rate: Mutex::new(0.0),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn is_observing(&self) -> bool {
        self.observing.load(Ordering::SeqCst)
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::SeqCst)
    }

    pub fn set_duration(&self, duration: Option<f64>) {
        *self.duration.lock() = duration;
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

impl FrameworkPlayer for FakeFrameworkPlayer {
    fn surface(&self) -> RenderSurface {
        self.surface.clone()
    }

    fn play(&self) {
        *self.rate.lock() = 1.0;
        self.record("play");
    }

    fn pause(&self) {
        *self.rate.lock() = 0.0;
        self.record("pause");
    }

    fn set_volume(&self, volume: f32) {
        self.record(format!("volume {volume}"));
    }

    fn set_muted(&self, muted: bool) {
        self.record(format!("muted {muted}"));
    }

    fn seek(&self, seconds: f64) {
        *self.current_time.lock() = Some(seconds);
        self.record(format!("seek {seconds}"));
    }

    fn add_periodic_time_observer(&self, interval: Duration) {
        self.observing.store(true, Ordering::SeqCst);
        self.record(format!("observe {}ms", interval.as_millis()));
    }

    fn remove_periodic_time_observer(&self) {
        self.observing.store(false, Ordering::SeqCst);
        self.record("unobserve");
    }

    fn set_surface_attached(&self, attached: bool) {
        self.attached.store(attached, Ordering::SeqCst);
        self.record(format!("attached {attached}"));
    }

    fn status(&self) -> ItemStatus {
        ItemStatus::Unknown
    }

    fn current_time(&self) -> Option<f64> {
        *self.current_time.lock()
    }

    fn duration(&self) -> Option<f64> {
        *self.duration.lock()
    }

    fn rate(&self) -> f32 {
        *self.rate.lock()
    }

    fn invalidate(&self) {
        self.invalidated.store(true, Ordering::SeqCst);
        self.record("invalidate");
    }
}

struct FrameworkBinding {
    player: Arc<FakeFrameworkPlayer>,
    signals: Arc<dyn SignalSink<FrameworkSignal>>,
}

/// Framework whose players are kept around so tests can drive them.
#[derive(Default)]
pub struct FakeFramework {
    bindings: Mutex<Vec<FrameworkBinding>>,
    sources: Mutex<Vec<String>>,
    reject: AtomicBool,
}

impl FakeFramework {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reject_sources(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }

    pub fn accept_sources(&self) {
        self.reject.store(false, Ordering::SeqCst);
    }

    pub fn players_created(&self) -> usize {
        self.bindings.lock().len()
    }

    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().clone()
    }

    /// Most recently created player.
    pub fn player(&self) -> Arc<FakeFrameworkPlayer> {
        self.bindings
            .lock()
            .last()
            .map(|b| b.player.clone())
            .expect("no framework player created")
    }

    pub fn player_at(&self, index: usize) -> Arc<FakeFrameworkPlayer> {
        self.bindings.lock()[index].player.clone()
    }

    /// Delivers `signal` through the most recent player's observer.
    pub fn signal(&self, signal: FrameworkSignal) {
        let signals = self
            .bindings
            .lock()
            .last()
            .map(|b| b.signals.clone())
            .expect("no framework player created");
        signals.emit(signal);
    }

    /// Delivers `signal` through the observer of the `index`-th player.
    pub fn signal_player(&self, index: usize, signal: FrameworkSignal) {
        let signals = self.bindings.lock()[index].signals.clone();
        signals.emit(signal);
    }

    pub fn ready(&self) {
        self.signal(FrameworkSignal::StatusChanged {
            old: ItemStatus::Unknown,
            new: ItemStatus::ReadyToPlay,
            error: None,
        });
    }
}

impl MediaFramework for FakeFramework {
    fn create_player(
        &self,
        source: &str,
        signals: Arc<dyn SignalSink<FrameworkSignal>>,
    ) -> BridgeResult<Arc<dyn FrameworkPlayer>> {
        self.sources.lock().push(source.to_string());
        if self.reject.load(Ordering::SeqCst) {
            return Err(BridgeError::SourceRejected(source.to_string()));
        }
        let player = Arc::new(FakeFrameworkPlayer::new());
        self.bindings.lock().push(FrameworkBinding {
            player: player.clone(),
            signals,
        });
        Ok(player)
    }
}

// ============================================================================
// Fake Streaming SDK
// ============================================================================

pub struct FakeSdkPlayer {
    calls: Mutex<Vec<String>>,
    view: Option<RenderSurface>,
    rendering: AtomicBool,
    current_time: Mutex<Option<f64>>,
    total: Mutex<Option<f64>>,
}

impl FakeSdkPlayer {
    fn new(with_view: bool) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            view: with_view.then(|| RenderSurface::new("sdk-view")),
            rendering: AtomicBool::new(true),
            current_time: Mutex::new(None),
            total: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering.load(Ordering::SeqCst)
    }

    pub fn set_position(&self, current: f64, total: f64) {
        *self.current_time.lock() = Some(current);
        *self.total.lock() = Some(total);
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

impl SdkPlayer for FakeSdkPlayer {
    fn view(&self) -> Option<RenderSurface> {
        self.view.clone()
    }

    fn play(&self) {
        self.record("play");
    }

    fn resume(&self) {
        self.record("resume");
    }

    fn pause(&self) {
        self.record("pause");
    }

    fn stop(&self) {
        self.record("stop");
    }

    fn seek(&self, seconds: f64) {
        self.record(format!("seek {seconds}"));
    }

    fn set_volume(&self, volume: f32) {
        self.record(format!("volume {volume}"));
    }

    fn set_muted(&self, muted: bool) {
        self.record(format!("muted {muted}"));
    }

    fn set_rendering_enabled(&self, enabled: bool) {
        self.rendering.store(enabled, Ordering::SeqCst);
        self.record(format!("rendering {enabled}"));
    }

    fn status(&self) -> SdkStatus {
        SdkStatus::Unknown
    }

    fn current_time(&self) -> Option<f64> {
        *self.current_time.lock()
    }

    fn total_duration(&self) -> Option<f64> {
        *self.total.lock()
    }

    fn play_speed(&self) -> f32 {
        1.0
    }
}

struct SdkBinding {
    player: Arc<FakeSdkPlayer>,
    delegate: Arc<dyn SignalSink<SdkSignal>>,
}

#[derive(Default)]
pub struct FakeSdk {
    bindings: Mutex<Vec<SdkBinding>>,
    options: Mutex<Option<SdkPlayerOptions>>,
    without_view: AtomicBool,
}

impl FakeSdk {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_views(&self) {
        self.without_view.store(true, Ordering::SeqCst);
    }

    pub fn options(&self) -> Option<SdkPlayerOptions> {
        self.options.lock().clone()
    }

    pub fn player(&self) -> Arc<FakeSdkPlayer> {
        self.bindings
            .lock()
            .last()
            .map(|b| b.player.clone())
            .expect("no SDK player created")
    }

    pub fn signal(&self, signal: SdkSignal) {
        let delegate = self
            .bindings
            .lock()
            .last()
            .map(|b| b.delegate.clone())
            .expect("no SDK player created");
        delegate.emit(signal);
    }

    pub fn status(&self, status: SdkStatus) {
        self.signal(SdkSignal::StatusChanged(status));
    }
}

impl StreamingSdk for FakeSdk {
    fn create_player(
        &self,
        _source: &str,
        options: &SdkPlayerOptions,
        delegate: Arc<dyn SignalSink<SdkSignal>>,
    ) -> BridgeResult<Arc<dyn SdkPlayer>> {
        *self.options.lock() = Some(options.clone());
        let player = Arc::new(FakeSdkPlayer::new(!self.without_view.load(Ordering::SeqCst)));
        self.bindings.lock().push(SdkBinding {
            player: player.clone(),
            delegate,
        });
        Ok(player)
    }
}

// ============================================================================
// Session Builders
// ============================================================================

pub struct Harness<B> {
    pub session: PlaybackSession,
    pub backend: Arc<B>,
    pub listener: Arc<RecordingListener>,
    pub audio: Arc<DesktopAudioSession>,
    pub remote: Arc<DesktopRemoteCommandCenter>,
}

pub fn framework_harness(policy: PlaybackPolicy) -> Harness<FakeFramework> {
    let backend = FakeFramework::new();
    let audio = Arc::new(DesktopAudioSession::new());
    let remote = Arc::new(DesktopRemoteCommandCenter::new());
    let config = PlayerConfig::builder()
        .media_framework(backend.clone())
        .audio_session(audio.clone())
        .remote_commands(remote.clone())
        .policy(policy)
        .build()
        .expect("valid framework config");
    harness(config, backend, audio, remote)
}

pub fn sdk_harness(policy: PlaybackPolicy) -> Harness<FakeSdk> {
    let backend = FakeSdk::new();
    let audio = Arc::new(DesktopAudioSession::new());
    let remote = Arc::new(DesktopRemoteCommandCenter::new());
    let config = PlayerConfig::builder()
        .streaming_sdk(backend.clone())
        .audio_session(audio.clone())
        .remote_commands(remote.clone())
        .policy(policy)
        .build()
        .expect("valid SDK config");
    harness(config, backend, audio, remote)
}

fn harness<B>(
    config: PlayerConfig,
    backend: Arc<B>,
    audio: Arc<DesktopAudioSession>,
    remote: Arc<DesktopRemoteCommandCenter>,
) -> Harness<B> {
    let mut session = PlaybackSession::from_config(&config).expect("session from config");
    let listener = RecordingListener::new();
    session.subscribe(&listener);
    Harness {
        session,
        backend,
        listener,
        audio,
        remote,
    }
}

/// Callback that flips a flag when invoked.
pub fn completion_flag() -> (Arc<AtomicBool>, impl FnOnce() + Send + 'static) {
    let flag = Arc::new(AtomicBool::new(false));
    let setter = flag.clone();
    (flag, move || setter.store(true, Ordering::SeqCst))
}

pub fn fired(flag: &AtomicBool) -> bool {
    flag.load(Ordering::SeqCst)
}
