//! Process audio session abstraction.
//!
//! While a source is prepared the session category must be "playback" so audio
//! keeps running with the silent switch engaged and can be routed to the lock
//! screen. On stop the session is deactivated with notify-others semantics so
//! that other apps may resume their audio.
//!
//! Activation may block for a noticeable time on some platforms; the core
//! always calls these methods from a blocking worker, never from the control
//! context.

use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCategory {
    Ambient,
    SoloAmbient,
    Playback,
}

/// Options applied when deactivating the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeactivationOptions {
    /// Tell other audio sessions that they may resume.
    pub notify_others: bool,
}

impl DeactivationOptions {
    pub fn notify_others() -> Self {
        Self {
            notify_others: true,
        }
    }
}

/// Platform audio session.
///
/// # Platform Support
///
/// - **iOS**: `AVAudioSession.sharedInstance()`
/// - **Android**: audio focus requests
/// - **Desktop**: usually a logging no-op
#[cfg_attr(test, mockall::automock)]
pub trait AudioSession: Send + Sync {
    /// Set the session category.
    fn set_category(&self, category: AudioCategory) -> Result<()>;

    /// Activate the session.
    fn activate(&self) -> Result<()>;

    /// Deactivate the session.
    fn deactivate(&self, options: DeactivationOptions) -> Result<()>;
}

/// Configure `session` for video playback.
pub fn configure_for_playback(session: &dyn AudioSession) -> Result<()> {
    session.set_category(AudioCategory::Playback)?;
    session.activate()
}
