//! Audio session shim for desktop hosts.

use bridge_traits::{
    audio::{AudioCategory, AudioSession, DeactivationOptions},
    error::Result,
};
use parking_lot::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
struct SessionState {
    category: Option<AudioCategory>,
    active: bool,
    activations: u32,
}

/// Desktop audio session.
///
/// Desktop operating systems mix audio per process without a session
/// negotiation step, so this only records the requested state.
#[derive(Debug, Default)]
pub struct DesktopAudioSession {
    state: Mutex<SessionState>,
}

impl DesktopAudioSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(&self) -> Option<AudioCategory> {
        self.state.lock().category
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Number of times the session has been activated.
    pub fn activation_count(&self) -> u32 {
        self.state.lock().activations
    }
}

impl AudioSession for DesktopAudioSession {
    fn set_category(&self, category: AudioCategory) -> Result<()> {
        debug!(?category, "Setting audio session category");
        self.state.lock().category = Some(category);
        Ok(())
    }

    fn activate(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.active = true;
        state.activations += 1;
        debug!(activations = state.activations, "Audio session activated");
        Ok(())
    }

    fn deactivate(&self, options: DeactivationOptions) -> Result<()> {
        let mut state = self.state.lock();
        if !state.active {
            return Ok(());
        }
        state.active = false;
        debug!(
            notify_others = options.notify_others,
            "Audio session deactivated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::audio::configure_for_playback;

    #[test]
    fn test_configure_for_playback() {
        let session = DesktopAudioSession::new();
        configure_for_playback(&session).unwrap();

        assert_eq!(session.category(), Some(AudioCategory::Playback));
        assert!(session.is_active());
        assert_eq!(session.activation_count(), 1);
    }

    #[test]
    fn test_deactivate_is_idempotent() {
        let session = DesktopAudioSession::new();
        session.deactivate(DeactivationOptions::notify_others()).unwrap();
        assert!(!session.is_active());

        session.activate().unwrap();
        session.deactivate(DeactivationOptions::notify_others()).unwrap();
        session.deactivate(DeactivationOptions::default()).unwrap();
        assert!(!session.is_active());
        assert_eq!(session.activation_count(), 1);
    }
}
