//! # Now-Playing Bridge
//!
//! Keeps the system now-playing display in sync with a session and routes
//! remote transport commands back into it.
//!
//! ## Overview
//!
//! [`NowPlayingBridge`] is a [`PlaybackListener`]. Preparing a source
//! publishes fresh info, and every later state or telemetry callback
//! re-publishes title, artist, artwork, duration, elapsed time and rate to the
//! host's [`NowPlayingCenter`]. Stop and error clear the display.
//!
//! Remote commands (lock screen, headset buttons) enter through
//! [`NowPlayingBridge::handle_remote_command`] on whatever thread the host
//! delivers them and are queued on the session through its
//! [`SessionHandle`].

use crate::control::SessionHandle;
use crate::error::{PlaybackError, Result};
use crate::listener::PlaybackListener;
use crate::state::PlaybackState;
use bridge_traits::{
    MediaMetadata, NowPlayingCenter, NowPlayingInfo, RemoteCommand, RemoteCommandStatus,
};
use core_runtime::config::PlayerConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Publishes session telemetry to a [`NowPlayingCenter`].
pub struct NowPlayingBridge {
    center: Arc<dyn NowPlayingCenter>,
    session: SessionHandle,
    metadata: Mutex<MediaMetadata>,
    published: Mutex<Option<NowPlayingInfo>>,
}

impl NowPlayingBridge {
    pub fn new(center: Arc<dyn NowPlayingCenter>, session: SessionHandle) -> Self {
        Self {
            center,
            session,
            metadata: Mutex::new(MediaMetadata::default()),
            published: Mutex::new(None),
        }
    }

    /// Builds a bridge over the now-playing center of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Configuration`] if the configuration has no
    /// now-playing center.
    pub fn from_config(config: &PlayerConfig, session: SessionHandle) -> Result<Self> {
        let center = config.now_playing_center.clone().ok_or_else(|| {
            PlaybackError::Configuration("no now-playing center configured".to_string())
        })?;
        Ok(Self::new(center, session))
    }

    /// Sets the descriptive metadata shown for the current source.
    ///
    /// Published right away while a source is prepared, otherwise with the
    /// next prepare.
    pub fn set_metadata(&self, metadata: MediaMetadata) {
        *self.metadata.lock() = metadata.clone();
        if self.published.lock().is_some() {
            self.update(|info| info.metadata = metadata);
        }
    }

    /// Last info handed to the center, if any.
    pub fn current_info(&self) -> Option<NowPlayingInfo> {
        self.published.lock().clone()
    }

    pub fn handle_remote_command(&self, command: RemoteCommand) -> RemoteCommandStatus {
        match command {
            RemoteCommand::Play => self.request_play(),
            RemoteCommand::Pause => self.request_pause(),
        }
    }

    /// Remote "play". Rejected while there is nothing to resume.
    pub fn request_play(&self) -> RemoteCommandStatus {
        match self.session.state() {
            PlaybackState::Playing => RemoteCommandStatus::Success,
            PlaybackState::Paused => self.dispatch(self.session.play()),
            state => {
                debug!(%state, "Remote play rejected");
                RemoteCommandStatus::NoSuchContent
            }
        }
    }

    /// Remote "pause". Rejected while there is nothing playing.
    pub fn request_pause(&self) -> RemoteCommandStatus {
        match self.session.state() {
            PlaybackState::Paused => RemoteCommandStatus::Success,
            PlaybackState::Playing => self.dispatch(self.session.pause()),
            state => {
                debug!(%state, "Remote pause rejected");
                RemoteCommandStatus::NoSuchContent
            }
        }
    }

    fn dispatch(&self, queued: bool) -> RemoteCommandStatus {
        if queued {
            RemoteCommandStatus::Success
        } else {
            warn!(session_id = %self.session.id(), "Remote command for a closed session");
            RemoteCommandStatus::CommandFailed
        }
    }

    fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut NowPlayingInfo),
    {
        let mut published = self.published.lock();
        let info = published
            .get_or_insert_with(|| NowPlayingInfo::video(self.metadata.lock().clone()));
        apply(info);
        if let Err(err) = self.center.publish(info) {
            let err = PlaybackError::NowPlaying(err.to_string());
            warn!(error = %err, "Now playing update failed");
        }
    }

    /// Re-publishes rate, elapsed time and duration from the session's
    /// snapshot. Nothing is published while no source is prepared.
    fn refresh(&self) {
        let snapshot = self.session.snapshot();
        if !snapshot.prepared {
            return;
        }
        self.update(|info| {
            info.rate = match snapshot.state {
                PlaybackState::Playing => snapshot.rate.unwrap_or(info.default_rate),
                _ => 0.0,
            };
            info.elapsed = snapshot.current_time;
            info.duration = snapshot.total_time;
        });
    }

    fn clear(&self) {
        let had_info = self.published.lock().take().is_some();
        if !had_info {
            return;
        }
        if let Err(err) = self.center.clear() {
            warn!(error = %err, "Clearing now playing info failed");
        }
    }
}

impl PlaybackListener for NowPlayingBridge {
    fn on_playing(&self) {
        self.refresh();
    }

    fn on_paused(&self) {
        self.refresh();
    }

    fn on_stopped(&self) {
        if self.session.snapshot().prepared {
            // A new source replaces whatever was shown before.
            self.published.lock().take();
            self.refresh();
        } else {
            self.clear();
        }
    }

    fn on_finished(&self) {
        self.refresh();
    }

    fn on_error(&self, _error: &PlaybackError) {
        self.clear();
    }

    fn on_ready(&self) {
        self.refresh();
    }

    fn on_loading_begin(&self) {
        self.refresh();
    }

    fn on_loading_end(&self) {
        self.refresh();
    }

    fn on_buffer_progress(&self, _progress: f64) {
        self.refresh();
    }

    fn on_total_time(&self, _seconds: f64) {
        self.refresh();
    }

    fn on_current_time(&self, _seconds: f64) {
        self.refresh();
    }

    fn on_seek_finished(&self) {
        self.refresh();
    }
}
