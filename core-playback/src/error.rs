//! # Playback Error Types
//!
//! Errors produced while driving a playback backend.
//!
//! None of these cross the session's verb surface. Backend failures move the
//! session into [`PlaybackState::Error`](crate::state::PlaybackState::Error)
//! and reach hosts through
//! [`PlaybackListener::on_error`](crate::listener::PlaybackListener::on_error);
//! everything else is logged.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// The backend reported a fatal error for the current source.
    #[error("Backend failure: {0}")]
    BackendFailure(String),

    /// The backend could not produce a rendering surface.
    #[error("Rendering surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// The backend refused to open the source.
    #[error("Source rejected: {0}")]
    SourceRejected(String),

    // ========================================================================
    // Host Service Errors
    // ========================================================================
    /// Audio session category or activation failed.
    #[error("Audio session error: {0}")]
    AudioSession(String),

    /// The now-playing center rejected an update.
    #[error("Now playing update failed: {0}")]
    NowPlaying(String),

    /// A host bridge call failed.
    #[error("Bridge error: {0}")]
    Bridge(String),

    // ========================================================================
    // Control Errors
    // ========================================================================
    /// A verb was issued in a state that does not accept it.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The session could not be built from the supplied configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if the session can carry on after this error.
    ///
    /// Recoverable errors are logged and otherwise ignored; everything else
    /// ends the current source.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlaybackError::AudioSession(_)
                | PlaybackError::NowPlaying(_)
                | PlaybackError::InvalidOperation(_)
        )
    }

    /// Returns `true` if the error originated in the playback backend.
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::BackendFailure(_)
                | PlaybackError::SurfaceUnavailable(_)
                | PlaybackError::SourceRejected(_)
        )
    }
}

impl From<BridgeError> for PlaybackError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::SourceRejected(msg) => PlaybackError::SourceRejected(msg),
            other => PlaybackError::Bridge(other.to_string()),
        }
    }
}

impl From<core_runtime::Error> for PlaybackError {
    fn from(err: core_runtime::Error) -> Self {
        PlaybackError::Configuration(err.to_string())
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
