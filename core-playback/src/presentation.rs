//! # Presentation Binder
//!
//! Maps session callbacks onto overlay visibility for a player view.
//!
//! ## Overview
//!
//! The binder owns an [`OverlayModel`] and re-renders its
//! [`PresentationView`] whenever a callback changes it:
//!
//! | State | Visible |
//! |-------|---------|
//! | `Playing` / `Paused` | controls, with the play/pause indicator |
//! | `Stopped` | cover |
//! | `Finished` | finish overlay |
//! | `Error` | error overlay |
//!
//! The loading spinner is independent of the state. User actions from the
//! view are routed back to the session through its [`SessionHandle`].

use crate::control::SessionHandle;
use crate::error::PlaybackError;
use crate::listener::PlaybackListener;
use crate::state::{PlaybackState, TelemetrySnapshot};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// What the player view should show.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverlayModel {
    pub loading: bool,
    pub controls_visible: bool,
    /// Drives the play/pause toggle while controls are visible.
    pub is_playing: bool,
    pub cover_visible: bool,
    pub finish_visible: bool,
    pub error_visible: bool,
    pub current_time: f64,
    pub total_time: f64,
    pub buffer_progress: f64,
}

impl OverlayModel {
    /// Model for a view that has just been bound to a session.
    pub fn from_snapshot(snapshot: &TelemetrySnapshot) -> Self {
        let mut model = Self {
            loading: snapshot.loading,
            current_time: snapshot.current_time.unwrap_or(0.0),
            total_time: snapshot.total_time.unwrap_or(0.0),
            buffer_progress: snapshot.buffer_progress,
            ..Self::default()
        };
        model.apply_state(snapshot.state);
        model
    }

    /// Sets overlay visibility for `state`, leaving loading and telemetry
    /// untouched.
    pub fn apply_state(&mut self, state: PlaybackState) {
        self.controls_visible = state.has_content();
        self.is_playing = state == PlaybackState::Playing;
        self.cover_visible = state == PlaybackState::Stopped;
        self.finish_visible = state == PlaybackState::Finished;
        self.error_visible = state == PlaybackState::Error;
    }
}

/// A view able to draw an [`OverlayModel`].
pub trait PresentationView: Send + Sync {
    fn render(&self, model: &OverlayModel);
}

/// Input coming from the player view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserAction {
    Play,
    Pause,
    Seek(f64),
    /// Play again from the finish overlay.
    Replay,
    /// Retry from the error overlay.
    Retry,
    /// Play from the cover.
    CoverPlay,
}

type ActionHook = Arc<dyn Fn() + Send + Sync>;

/// Listener that keeps a [`PresentationView`] in step with a session.
pub struct PresentationBinder {
    view: Arc<dyn PresentationView>,
    session: SessionHandle,
    model: Mutex<OverlayModel>,
    retry_hook: Option<ActionHook>,
    cover_hook: Option<ActionHook>,
}

impl PresentationBinder {
    /// Binds `view` to `session` and renders the session's current state.
    pub fn new(view: Arc<dyn PresentationView>, session: SessionHandle) -> Self {
        let model = OverlayModel::from_snapshot(&session.snapshot());
        view.render(&model);
        Self {
            view,
            session,
            model: Mutex::new(model),
            retry_hook: None,
            cover_hook: None,
        }
    }

    /// Runs `hook` instead of a plain play when the user taps retry.
    ///
    /// A failed source has to be prepared again, which only the host can do.
    pub fn on_retry<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.retry_hook = Some(Arc::new(hook));
        self
    }

    /// Runs `hook` instead of a plain play when the user taps the cover.
    pub fn on_cover_play<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.cover_hook = Some(Arc::new(hook));
        self
    }

    pub fn model(&self) -> OverlayModel {
        *self.model.lock()
    }

    /// Re-reads the session snapshot and re-renders.
    pub fn sync(&self) {
        let model = OverlayModel::from_snapshot(&self.session.snapshot());
        *self.model.lock() = model;
        self.view.render(&model);
    }

    pub fn handle_action(&self, action: UserAction) {
        debug!(?action, "Player view action");
        match action {
            UserAction::Play | UserAction::Replay => {
                self.session.play();
            }
            UserAction::Pause => {
                self.session.pause();
            }
            UserAction::Seek(to) => {
                self.session.seek(to, || {});
            }
            UserAction::Retry => self.run_hook(self.retry_hook.as_ref()),
            UserAction::CoverPlay => self.run_hook(self.cover_hook.as_ref()),
        }
    }

    fn run_hook(&self, hook: Option<&ActionHook>) {
        match hook {
            Some(hook) => hook(),
            None => {
                self.session.play();
            }
        }
    }

    fn apply<F>(&self, change: F)
    where
        F: FnOnce(&mut OverlayModel),
    {
        let model = {
            let mut model = self.model.lock();
            let before = *model;
            change(&mut model);
            if *model == before {
                return;
            }
            *model
        };
        self.view.render(&model);
    }
}

impl PlaybackListener for PresentationBinder {
    fn on_playing(&self) {
        self.apply(|m| m.apply_state(PlaybackState::Playing));
    }

    fn on_paused(&self) {
        self.apply(|m| m.apply_state(PlaybackState::Paused));
    }

    fn on_stopped(&self) {
        self.apply(|m| {
            m.apply_state(PlaybackState::Stopped);
            m.current_time = 0.0;
            m.total_time = 0.0;
            m.buffer_progress = 0.0;
        });
    }

    fn on_finished(&self) {
        self.apply(|m| m.apply_state(PlaybackState::Finished));
    }

    fn on_error(&self, _error: &PlaybackError) {
        self.apply(|m| m.apply_state(PlaybackState::Error));
    }

    fn on_loading_begin(&self) {
        self.apply(|m| m.loading = true);
    }

    fn on_loading_end(&self) {
        self.apply(|m| m.loading = false);
    }

    fn on_buffer_progress(&self, progress: f64) {
        self.apply(|m| m.buffer_progress = progress);
    }

    fn on_total_time(&self, seconds: f64) {
        self.apply(|m| m.total_time = seconds);
    }

    fn on_current_time(&self, seconds: f64) {
        self.apply(|m| m.current_time = seconds);
    }
}

impl fmt::Debug for PresentationBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresentationBinder")
            .field("model", &self.model())
            .finish()
    }
}
