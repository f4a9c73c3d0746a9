//! # Playback Session
//!
//! The state machine that turns host verbs and backend milestones into
//! listener callbacks.
//!
//! ## Overview
//!
//! A [`PlaybackSession`] owns one [`EngineAdapter`], a registry of weakly
//! held [`PlaybackListener`]s and the current [`PlaybackPolicy`]. All state
//! changes go through a single transition function that deduplicates
//! repeated states, so listeners see each transition exactly once.
//!
//! The session is driven from one control context:
//!
//! - Direct verbs (`prepare`, `play`, `pause`, `seek`, `stop`) run
//!   synchronously on the owner.
//! - Backend events, [`SessionHandle`] commands and environment signals are
//!   queued in the control inbox and applied by [`PlaybackSession::pump`] or
//!   [`PlaybackSession::process_next`].
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::PlaybackSession;
//!
//! let mut session = PlaybackSession::from_config(&config)?;
//! session.subscribe(&listener);
//! let surface = session.prepare("https://cdn.example.com/clip.mp4");
//! loop {
//!     session.process_next().await;
//! }
//! ```

use crate::control::{Command, ControlMessage, SeekCompletion, SessionHandle};
use crate::engine::{
    EngineAdapter, EngineEvent, EngineEventSink, FrameworkAdapter, SdkAdapter, SeekPolicy,
};
use crate::error::{PlaybackError, Result};
use crate::listener::PlaybackListener;
use crate::registry::ObserverRegistry;
use crate::state::{MediaSource, PlaybackSessionId, PlaybackState, TelemetrySnapshot};
use bridge_traits::audio::configure_for_playback;
use bridge_traits::{
    AudioSession, DeactivationOptions, EnvironmentSignal, RemoteCommand, RemoteCommandCenter,
    RenderSurface, RouteChangeReason,
};
use core_runtime::config::{EngineKind, PlaybackPolicy, PlayerConfig};
use core_runtime::logging::redact_source;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, trace, warn};

/// What to do once an in-flight seek lands.
enum SeekOrigin {
    Caller(SeekCompletion),
    /// Internal rewind after the end of the media.
    Rewind,
}

struct PendingSeek {
    /// Playback was running when the seek started.
    resume: bool,
    /// The user asked to play while an end-of-media rewind was in flight.
    replay: bool,
    origin: SeekOrigin,
}

struct QueuedSeek {
    to: f64,
    completion: SeekCompletion,
}

/// A unified playback session over one engine adapter.
pub struct PlaybackSession {
    id: PlaybackSessionId,
    engine: Box<dyn EngineAdapter>,
    registry: ObserverRegistry<dyn PlaybackListener>,
    policy: PlaybackPolicy,
    audio_session: Arc<dyn AudioSession>,
    remote_commands: Option<Arc<dyn RemoteCommandCenter>>,
    remote_commands_enabled: bool,

    state: PlaybackState,
    /// Whether `state` has been broadcast at least once.
    announced: bool,
    loading: bool,
    ready: bool,
    source: Option<MediaSource>,
    user_paused: bool,
    backgrounded: bool,
    surface_detached: bool,
    current_time: Option<f64>,
    total_time: Option<f64>,
    buffer_progress: f64,
    last_error: Option<PlaybackError>,

    pending_seek: Option<PendingSeek>,
    queued_seek: Option<QueuedSeek>,
    /// Generation of the current backend; bumped on every teardown.
    epoch: u64,

    inbox: UnboundedReceiver<ControlMessage>,
    sender: UnboundedSender<ControlMessage>,
    snapshot: Arc<RwLock<TelemetrySnapshot>>,
}

impl PlaybackSession {
    /// Creates a session over `engine`.
    pub fn new(
        engine: Box<dyn EngineAdapter>,
        policy: PlaybackPolicy,
        audio_session: Arc<dyn AudioSession>,
    ) -> Self {
        let (sender, inbox) = mpsc::unbounded_channel();
        Self {
            id: PlaybackSessionId::new(),
            engine,
            registry: ObserverRegistry::new(),
            policy,
            audio_session,
            remote_commands: None,
            remote_commands_enabled: false,
            state: PlaybackState::Stopped,
            announced: false,
            loading: false,
            ready: false,
            source: None,
            user_paused: false,
            backgrounded: false,
            surface_detached: false,
            current_time: None,
            total_time: None,
            buffer_progress: 0.0,
            last_error: None,
            pending_seek: None,
            queued_seek: None,
            epoch: 0,
            inbox,
            sender,
            snapshot: Arc::new(RwLock::new(TelemetrySnapshot::default())),
        }
    }

    /// Enables and disables the remote play/pause commands as sources come
    /// and go.
    pub fn with_remote_commands(mut self, center: Arc<dyn RemoteCommandCenter>) -> Self {
        self.remote_commands = Some(center);
        self
    }

    /// Builds a session with the adapter selected by `config.engine`.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Configuration`] if the configuration does not
    /// validate or lacks the backend for the selected engine.
    pub fn from_config(config: &PlayerConfig) -> Result<Self> {
        config.validate()?;

        let engine: Box<dyn EngineAdapter> = match config.engine {
            EngineKind::Framework => {
                let framework = config.media_framework.clone().ok_or_else(|| {
                    PlaybackError::Configuration("no media framework configured".to_string())
                })?;
                Box::new(FrameworkAdapter::new(framework, config.sample_interval))
            }
            EngineKind::StreamingSdk => {
                let sdk = config.streaming_sdk.clone().ok_or_else(|| {
                    PlaybackError::Configuration("no streaming SDK configured".to_string())
                })?;
                Box::new(SdkAdapter::new(
                    sdk,
                    config.sdk_options.clone(),
                    config.sdk_sample_interval,
                ))
            }
        };

        let mut session = Self::new(engine, config.policy, config.audio_session.clone());
        session.remote_commands = config.remote_commands.clone();
        debug!(
            session_id = %session.id,
            engine = config.engine.as_str(),
            "Playback session created"
        );
        Ok(session)
    }

    pub fn id(&self) -> PlaybackSessionId {
        self.id
    }

    /// Returns a thread-safe handle that queues commands for this session.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.id, self.sender.clone(), Arc::clone(&self.snapshot))
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Registers `listener` without taking ownership of it.
    ///
    /// Subscribing the same listener twice has no effect.
    pub fn subscribe<L>(&mut self, listener: &Arc<L>) -> bool
    where
        L: PlaybackListener + 'static,
    {
        let listener: Arc<dyn PlaybackListener> = listener.clone();
        self.registry.subscribe(Arc::downgrade(&listener))
    }

    pub fn unsubscribe<L>(&mut self, listener: &Arc<L>) -> bool
    where
        L: PlaybackListener + 'static,
    {
        let listener: Arc<dyn PlaybackListener> = listener.clone();
        self.registry.unsubscribe(&Arc::downgrade(&listener))
    }

    pub fn listener_count(&mut self) -> usize {
        self.registry.prune();
        self.registry.len()
    }

    // ========================================================================
    // Verbs
    // ========================================================================

    /// Replaces the current source with `source` and starts probing
    /// readiness.
    ///
    /// The session is `Stopped` and loading when this returns. If the
    /// backend cannot be built the session moves to `Error` and an empty
    /// surface is returned.
    pub fn prepare(&mut self, source: impl Into<MediaSource>) -> RenderSurface {
        let source = source.into();
        info!(
            session_id = %self.id,
            engine = self.engine.kind().as_str(),
            source = %redact_source(source.as_str()),
            "Preparing source"
        );

        self.teardown_backend();
        self.reset_media_state();
        self.last_error = None;

        let events = EngineEventSink::new(self.epoch, self.sender.clone());
        match self.engine.load(&source, &self.policy, events) {
            Ok(surface) => {
                self.source = Some(source);
                self.set_loading(true);
                self.transition(PlaybackState::Stopped);
                self.engine.set_sampling(true);
                if self.backgrounded && !self.policy.background_playback {
                    self.detach_surface();
                }
                self.configure_audio_session();
                self.set_remote_commands_enabled(true);
                surface
            }
            Err(err) => {
                self.fail(err);
                RenderSurface::empty()
            }
        }
    }

    /// Starts or resumes playback. Ignored until the source is ready.
    pub fn play(&mut self) {
        if !self.ready {
            debug!(session_id = %self.id, "Ignoring play before source is ready");
            return;
        }
        self.engine.play();
        self.user_paused = false;
        if let Some(pending) = &mut self.pending_seek {
            pending.replay = matches!(pending.origin, SeekOrigin::Rewind);
        }
        self.transition(PlaybackState::Playing);
    }

    /// Pauses playback on the user's behalf. Ignored until the source is
    /// ready.
    pub fn pause(&mut self) {
        if !self.ready {
            debug!(session_id = %self.id, "Ignoring pause before source is ready");
            return;
        }
        self.engine.pause();
        self.user_paused = true;
        if let Some(pending) = &mut self.pending_seek {
            pending.replay = false;
        }
        self.transition(PlaybackState::Paused);
    }

    /// Releases the backend and clears the source.
    pub fn stop(&mut self) {
        info!(session_id = %self.id, "Stopping playback");
        self.teardown_backend();
        self.reset_media_state();
        self.deactivate_audio_session();
        self.transition(PlaybackState::Stopped);
    }

    /// Seeks to `to` seconds and calls `on_complete` when done.
    ///
    /// Before the source is ready, or while another seek is in flight on an
    /// adapter that rejects concurrent seeks, `on_complete` runs immediately
    /// and nothing else happens.
    pub fn seek<F>(&mut self, to: f64, on_complete: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.request_seek(to, Box::new(on_complete));
    }

    // ========================================================================
    // Policy
    // ========================================================================

    pub fn policy(&self) -> &PlaybackPolicy {
        &self.policy
    }

    /// Replaces the whole policy and applies it to the active backend.
    pub fn set_policy(&mut self, policy: PlaybackPolicy) -> Result<()> {
        policy.validate()?;
        self.policy = policy;
        self.engine.apply_policy(&self.policy);
        Ok(())
    }

    /// Sets the output volume, clamped to `0.0..=1.0`.
    pub fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            warn!(session_id = %self.id, volume, "Ignoring non-finite volume");
            return;
        }
        self.policy.volume = volume.clamp(0.0, 1.0);
        self.engine.apply_policy(&self.policy);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.policy.muted = muted;
        self.engine.apply_policy(&self.policy);
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.policy.looping = looping;
    }

    pub fn set_background_playback(&mut self, enabled: bool) {
        self.policy.background_playback = enabled;
    }

    pub fn set_auto_play(&mut self, enabled: bool) {
        self.policy.auto_play = enabled;
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn source(&self) -> Option<&MediaSource> {
        self.source.as_ref()
    }

    pub fn current_time(&self) -> Option<f64> {
        self.source.as_ref()?;
        self.current_time.or_else(|| self.engine.current_time())
    }

    pub fn total_time(&self) -> Option<f64> {
        self.source.as_ref()?;
        self.total_time.or_else(|| self.engine.total_time())
    }

    pub fn buffer_progress(&self) -> f64 {
        self.buffer_progress
    }

    pub fn rate(&self) -> Option<f32> {
        self.source.as_ref()?;
        self.engine.rate()
    }

    pub fn last_error(&self) -> Option<&PlaybackError> {
        self.last_error.as_ref()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.snapshot.read().clone()
    }

    // ========================================================================
    // Inbox
    // ========================================================================

    /// Applies every queued message without waiting. Returns how many were
    /// handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.inbox.try_recv() {
            self.dispatch(message);
            handled += 1;
        }
        handled
    }

    /// Waits for the next queued message and applies it.
    ///
    /// The session keeps a sender of its own, so this only returns after a
    /// message was handled.
    pub async fn process_next(&mut self) {
        if let Some(message) = self.inbox.recv().await {
            self.dispatch(message);
        }
    }

    /// Applies a host lifecycle notification immediately.
    pub fn handle_environment(&mut self, signal: EnvironmentSignal) {
        debug!(session_id = %self.id, ?signal, "Environment signal");
        match signal {
            EnvironmentSignal::EnteredBackground => self.enter_background(),
            EnvironmentSignal::WillEnterForeground => self.enter_foreground(),
            _ if self.source.is_none() => {
                trace!(session_id = %self.id, "No source, ignoring audio signal");
            }
            EnvironmentSignal::RouteChanged(RouteChangeReason::OldDeviceUnavailable) => {
                if self.state == PlaybackState::Playing {
                    self.pause_without_user_intent();
                }
            }
            EnvironmentSignal::RouteChanged(_) => {}
            EnvironmentSignal::InterruptionBegan => {
                if !self.user_paused && self.state == PlaybackState::Playing {
                    self.pause_without_user_intent();
                }
            }
            EnvironmentSignal::InterruptionEnded => {
                if !self.user_paused && self.state == PlaybackState::Paused {
                    self.play();
                }
            }
        }
    }

    fn dispatch(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::Engine { epoch, event } => {
                if epoch != self.epoch {
                    trace!(session_id = %self.id, ?event, "Dropping event from released backend");
                    return;
                }
                self.handle_engine_event(event);
            }
            ControlMessage::Command(command) => self.handle_command(command),
            ControlMessage::Environment(signal) => self.handle_environment(signal),
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::Stop => self.stop(),
            Command::Seek { to, completion } => self.request_seek(to, completion),
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Ready => self.on_backend_ready(),
            EngineEvent::Failed(err) => self.fail(err),
            EngineEvent::LoadingBegan => self.set_loading(true),
            EngineEvent::LoadingEnded => self.set_loading(false),
            EngineEvent::BufferedTo(seconds) => self.update_buffer(seconds),
            EngineEvent::Duration(duration) => self.update_total_time(duration),
            EngineEvent::Time(seconds) => self.update_current_time(seconds),
            EngineEvent::SeekCompleted => self.complete_seek(),
            EngineEvent::EndOfMedia => self.on_end_of_media(),
            EngineEvent::Stalled => {
                if self.state == PlaybackState::Playing {
                    debug!(session_id = %self.id, "Playback stalled, nudging backend");
                    self.engine.play();
                }
            }
            EngineEvent::Retry => {
                if self.source.is_some() && !self.user_paused {
                    warn!(session_id = %self.id, "Backend reported a recoverable error, retrying");
                    self.engine.play();
                }
            }
            EngineEvent::PausedByEngine => {
                if self.ready
                    && self.state == PlaybackState::Playing
                    && self.pending_seek.is_none()
                {
                    debug!(session_id = %self.id, "Backend paused on its own");
                    self.transition(PlaybackState::Paused);
                }
            }
            EngineEvent::Reconnecting => {
                if self.ready && !self.user_paused {
                    self.transition(PlaybackState::Playing);
                }
            }
            EngineEvent::Environment(signal) => self.handle_environment(signal),
        }
    }

    // ========================================================================
    // Backend milestones
    // ========================================================================

    fn on_backend_ready(&mut self) {
        if self.ready {
            trace!(session_id = %self.id, "Ignoring repeated readiness");
            return;
        }
        self.ready = true;
        debug!(session_id = %self.id, auto_play = self.policy.auto_play, "Source ready");
        self.notify(|l| l.on_ready());

        if !self.policy.auto_play {
            self.engine.pause();
            self.user_paused = true;
            self.transition(PlaybackState::Paused);
        } else if self.backgrounded && !self.policy.background_playback {
            // Auto play waits for the foreground.
            debug!(session_id = %self.id, "Ready in background, holding playback");
            self.pause_without_user_intent();
        } else {
            self.play();
        }
    }

    fn on_end_of_media(&mut self) {
        if !self.ready {
            return;
        }
        if self.pending_seek.is_some() {
            debug!(session_id = %self.id, "End of media while seeking, ignoring");
            return;
        }
        debug!(session_id = %self.id, looping = self.policy.looping, "End of media, rewinding");
        self.engine.pause();
        self.start_seek(0.0, SeekOrigin::Rewind);
    }

    fn finish_rewind(&mut self, replay: bool) {
        if self.policy.looping || replay {
            self.current_time = Some(0.0);
            self.notify(|l| l.on_current_time(0.0));
            if !self.user_paused {
                self.engine.play();
                self.transition(PlaybackState::Playing);
            }
        } else {
            // A play issued before the rewind started may still be running.
            self.engine.pause();
            self.transition(PlaybackState::Finished);
        }
    }

    fn fail(&mut self, err: PlaybackError) {
        error!(session_id = %self.id, error = %err, "Playback failed");
        self.teardown_backend();
        self.reset_media_state();
        self.last_error = Some(err);
        self.transition(PlaybackState::Error);
    }

    // ========================================================================
    // Telemetry
    // ========================================================================

    fn update_total_time(&mut self, duration: Option<f64>) {
        let Some(seconds) = duration.filter(|d| d.is_finite() && *d > 0.0) else {
            return;
        };
        if self.total_time == Some(seconds) {
            return;
        }
        self.total_time = Some(seconds);
        self.notify(|l| l.on_total_time(seconds));
    }

    fn update_current_time(&mut self, seconds: f64) {
        if self.source.is_none() || self.pending_seek.is_some() || !seconds.is_finite() {
            return;
        }
        self.current_time = Some(seconds);
        self.notify(|l| l.on_current_time(seconds));
    }

    fn update_buffer(&mut self, buffered_to: f64) {
        let total = self
            .total_time
            .or_else(|| self.engine.total_time())
            .filter(|t| t.is_finite() && *t > 0.0);
        let Some(total) = total else {
            trace!(session_id = %self.id, "Duration unknown, suppressing buffer progress");
            return;
        };
        if !buffered_to.is_finite() {
            return;
        }
        let progress = (buffered_to / total).clamp(0.0, 1.0);
        self.buffer_progress = progress;
        self.notify(|l| l.on_buffer_progress(progress));
    }

    fn set_loading(&mut self, loading: bool) {
        if self.loading == loading {
            return;
        }
        self.loading = loading;
        if loading {
            self.notify(|l| l.on_loading_begin());
        } else {
            self.notify(|l| l.on_loading_end());
        }
    }

    // ========================================================================
    // Seeking
    // ========================================================================

    fn request_seek(&mut self, to: f64, completion: SeekCompletion) {
        if !self.ready {
            debug!(session_id = %self.id, "Ignoring seek before source is ready");
            completion();
            return;
        }
        if !to.is_finite() {
            warn!(session_id = %self.id, to, "Ignoring seek to non-finite position");
            completion();
            return;
        }
        let to = to.max(0.0);

        if self.pending_seek.is_some() {
            match self.engine.seek_policy() {
                SeekPolicy::Reject => {
                    debug!(session_id = %self.id, to, "Seek already in flight, rejecting");
                    completion();
                }
                SeekPolicy::QueueLatest => {
                    let queued = QueuedSeek { to, completion };
                    if let Some(superseded) = self.queued_seek.replace(queued) {
                        debug!(session_id = %self.id, to = superseded.to, "Queued seek superseded");
                        (superseded.completion)();
                    }
                }
            }
            return;
        }

        self.start_seek(to, SeekOrigin::Caller(completion));
    }

    fn start_seek(&mut self, to: f64, origin: SeekOrigin) {
        let resume = matches!(origin, SeekOrigin::Caller(_)) && self.state == PlaybackState::Playing;
        debug!(session_id = %self.id, to, resume, "Seeking");
        self.pending_seek = Some(PendingSeek {
            resume,
            replay: false,
            origin,
        });
        self.engine.begin_seek(to, resume);
    }

    fn complete_seek(&mut self) {
        let Some(pending) = self.pending_seek.take() else {
            trace!(session_id = %self.id, "Seek completion without a pending seek");
            return;
        };
        // A pause issued during the seek wins over the state it started in.
        let resume =
            pending.resume && self.state == PlaybackState::Playing && !self.user_paused;
        self.engine.finish_seek(resume);
        self.notify(|l| l.on_seek_finished());

        match pending.origin {
            SeekOrigin::Caller(completion) => completion(),
            SeekOrigin::Rewind => self.finish_rewind(pending.replay),
        }

        if self.pending_seek.is_none() && self.ready {
            if let Some(next) = self.queued_seek.take() {
                self.start_seek(next.to, SeekOrigin::Caller(next.completion));
            }
        }
    }

    // ========================================================================
    // Environment
    // ========================================================================

    fn pause_without_user_intent(&mut self) {
        if !self.ready {
            return;
        }
        self.engine.pause();
        self.user_paused = false;
        self.transition(PlaybackState::Paused);
    }

    fn enter_background(&mut self) {
        if self.backgrounded {
            return;
        }
        self.backgrounded = true;
        if self.source.is_none() || self.policy.background_playback {
            return;
        }
        if !self.user_paused && self.state == PlaybackState::Playing {
            self.pause_without_user_intent();
        }
        self.detach_surface();
    }

    fn detach_surface(&mut self) {
        self.engine.set_sampling(false);
        self.engine.set_surface_attached(false);
        self.surface_detached = true;
        debug!(session_id = %self.id, "Surface detached for background");
    }

    fn enter_foreground(&mut self) {
        if !self.backgrounded {
            return;
        }
        self.backgrounded = false;
        if !self.surface_detached {
            return;
        }
        self.surface_detached = false;
        self.engine.set_surface_attached(true);
        self.engine.set_sampling(true);
        debug!(session_id = %self.id, "Surface reattached for foreground");
        if !self.user_paused && self.state == PlaybackState::Paused {
            self.play();
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn transition(&mut self, next: PlaybackState) {
        if self.announced && self.state == next {
            return;
        }
        self.announced = true;
        debug!(session_id = %self.id, from = %self.state, to = %next, "State transition");
        self.state = next;

        let error = if next == PlaybackState::Error {
            Some(self.last_error.clone().unwrap_or_else(|| {
                PlaybackError::Internal("unspecified playback failure".to_string())
            }))
        } else {
            None
        };

        self.notify(|l| match next {
            PlaybackState::Stopped => l.on_stopped(),
            PlaybackState::Playing => l.on_playing(),
            PlaybackState::Paused => l.on_paused(),
            PlaybackState::Finished => l.on_finished(),
            PlaybackState::Error => {
                if let Some(err) = &error {
                    l.on_error(err);
                }
            }
        });
    }

    fn notify<F>(&mut self, f: F)
    where
        F: FnMut(&(dyn PlaybackListener + 'static)),
    {
        self.refresh_snapshot();
        self.registry.broadcast(f);
    }

    fn refresh_snapshot(&self) {
        let snapshot = TelemetrySnapshot {
            state: self.state,
            prepared: self.source.is_some(),
            loading: self.loading,
            ready: self.ready,
            current_time: self.current_time,
            total_time: self.total_time,
            buffer_progress: self.buffer_progress,
            rate: self.rate(),
        };
        *self.snapshot.write() = snapshot;
    }

    /// Invalidates the current backend generation and releases it. Pending
    /// seek completions are dropped without being called.
    fn teardown_backend(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        let discarded = self.pending_seek.take().is_some() | self.queued_seek.take().is_some();
        if discarded {
            debug!(session_id = %self.id, "Discarding in-flight seek");
        }
        self.engine.release();
        self.set_remote_commands_enabled(false);
    }

    fn reset_media_state(&mut self) {
        self.source = None;
        self.ready = false;
        self.user_paused = false;
        self.surface_detached = false;
        self.current_time = None;
        self.total_time = None;
        self.buffer_progress = 0.0;
        self.set_loading(false);
        self.refresh_snapshot();
    }

    fn configure_audio_session(&self) {
        let audio = Arc::clone(&self.audio_session);
        let id = self.id;
        run_blocking(move || {
            if let Err(err) = configure_for_playback(audio.as_ref()) {
                error!(session_id = %id, error = %err, "Audio session setup failed");
            }
        });
    }

    fn deactivate_audio_session(&self) {
        let audio = Arc::clone(&self.audio_session);
        let id = self.id;
        run_blocking(move || {
            if let Err(err) = audio.deactivate(DeactivationOptions::notify_others()) {
                warn!(session_id = %id, error = %err, "Audio session deactivation failed");
            }
        });
    }

    fn set_remote_commands_enabled(&mut self, enabled: bool) {
        if self.remote_commands_enabled == enabled {
            return;
        }
        self.remote_commands_enabled = enabled;
        let Some(center) = &self.remote_commands else {
            return;
        };
        for command in [RemoteCommand::Play, RemoteCommand::Pause] {
            if let Err(err) = center.set_enabled(command, enabled) {
                warn!(session_id = %self.id, ?command, error = %err, "Remote command update failed");
            }
        }
        if let Err(err) = center.set_receiving(enabled) {
            warn!(session_id = %self.id, error = %err, "Remote control registration failed");
        }
    }
}

/// Runs `work` on tokio's blocking pool, or on a dedicated thread outside a
/// runtime.
fn run_blocking<F>(work: F)
where
    F: FnOnce() + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(work);
        }
        Err(_) => {
            if let Err(err) = std::thread::Builder::new()
                .name("vpc-audio-session".to_string())
                .spawn(work)
            {
                error!(error = %err, "Failed to spawn audio session worker");
            }
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        if self.source.is_some() {
            self.engine.release();
            self.set_remote_commands_enabled(false);
        }
    }
}

impl fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("id", &self.id)
            .field("engine", &self.engine.kind())
            .field("state", &self.state)
            .field("loading", &self.loading)
            .field("ready", &self.ready)
            .field("listeners", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::DesktopAudioSession;
    use parking_lot::Mutex;

    /// Adapter that records calls and never produces events on its own.
    #[derive(Default)]
    struct ScriptedEngine {
        calls: Arc<Mutex<Vec<String>>>,
        fail_load: bool,
    }

    impl EngineAdapter for ScriptedEngine {
        fn kind(&self) -> EngineKind {
            EngineKind::Framework
        }

        fn seek_policy(&self) -> SeekPolicy {
            SeekPolicy::Reject
        }

        fn load(
            &mut self,
            source: &MediaSource,
            _policy: &PlaybackPolicy,
            _events: EngineEventSink,
        ) -> Result<RenderSurface> {
            self.calls.lock().push(format!("load {}", source.as_str()));
            if self.fail_load {
                return Err(PlaybackError::SurfaceUnavailable("no view".into()));
            }
            Ok(RenderSurface::new(7u32))
        }

        fn release(&mut self) {
            self.calls.lock().push("release".into());
        }

        fn play(&mut self) {
            self.calls.lock().push("play".into());
        }

        fn pause(&mut self) {
            self.calls.lock().push("pause".into());
        }

        fn begin_seek(&mut self, to: f64, _was_playing: bool) {
            self.calls.lock().push(format!("seek {to}"));
        }

        fn finish_seek(&mut self, _was_playing: bool) {}

        fn set_sampling(&mut self, _enabled: bool) {}

        fn apply_policy(&mut self, policy: &PlaybackPolicy) {
            self.calls.lock().push(format!("volume {}", policy.volume));
        }

        fn set_surface_attached(&mut self, _attached: bool) {}

        fn current_time(&self) -> Option<f64> {
            None
        }

        fn total_time(&self) -> Option<f64> {
            None
        }

        fn rate(&self) -> Option<f32> {
            Some(1.0)
        }
    }

    fn session(engine: ScriptedEngine) -> PlaybackSession {
        PlaybackSession::new(
            Box::new(engine),
            PlaybackPolicy::default(),
            Arc::new(DesktopAudioSession::new()),
        )
    }

    fn emit(session: &PlaybackSession, event: EngineEvent) {
        session
            .sender
            .send(ControlMessage::Engine {
                epoch: session.epoch,
                event,
            })
            .unwrap();
    }

    #[test]
    fn test_prepare_sets_loading_and_stopped() {
        let mut session = session(ScriptedEngine::default());
        let surface = session.prepare("file:///clip.mp4");

        assert!(!surface.is_empty());
        assert!(session.is_loading());
        assert!(!session.is_ready());
        assert_eq!(session.state(), PlaybackState::Stopped);
        assert_eq!(session.source().map(|s| s.as_str()), Some("file:///clip.mp4"));
    }

    #[test]
    fn test_failed_load_returns_empty_surface() {
        let mut session = session(ScriptedEngine {
            fail_load: true,
            ..Default::default()
        });
        let surface = session.prepare("file:///clip.mp4");

        assert!(surface.is_empty());
        assert_eq!(session.state(), PlaybackState::Error);
        assert!(!session.is_loading());
        assert!(matches!(
            session.last_error(),
            Some(PlaybackError::SurfaceUnavailable(_))
        ));
    }

    #[test]
    fn test_verbs_before_ready_are_ignored() {
        let engine = ScriptedEngine::default();
        let calls = engine.calls.clone();
        let mut session = session(engine);
        session.prepare("a.mp4");

        session.play();
        session.pause();
        assert_eq!(session.state(), PlaybackState::Stopped);
        assert!(!calls.lock().iter().any(|c| c == "play" || c == "pause"));
    }

    #[test]
    fn test_stale_events_are_dropped() {
        let mut session = session(ScriptedEngine::default());
        session.prepare("a.mp4");
        let stale_epoch = session.epoch;
        session.prepare("b.mp4");

        session
            .sender
            .send(ControlMessage::Engine {
                epoch: stale_epoch,
                event: EngineEvent::Ready,
            })
            .unwrap();
        session.pump();
        assert!(!session.is_ready());

        emit(&session, EngineEvent::Ready);
        session.pump();
        assert!(session.is_ready());
        assert_eq!(session.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_volume_is_clamped_and_applied() {
        let engine = ScriptedEngine::default();
        let calls = engine.calls.clone();
        let mut session = session(engine);

        session.set_volume(3.0);
        assert_eq!(session.policy().volume, 1.0);
        session.set_volume(f32::NAN);
        assert_eq!(session.policy().volume, 1.0);
        assert!(calls.lock().iter().any(|c| c == "volume 1"));
    }

    #[test]
    fn test_snapshot_tracks_state() {
        let mut session = session(ScriptedEngine::default());
        let handle = session.handle();
        session.prepare("a.mp4");
        emit(&session, EngineEvent::Ready);
        session.pump();

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Playing);
        assert!(snapshot.ready);
        assert_eq!(snapshot.rate, Some(1.0));
    }
}
