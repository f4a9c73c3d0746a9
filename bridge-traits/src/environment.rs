//! Host environment notifications relevant to playback.
//!
//! Hosts forward audio-route, audio-interruption, and application lifecycle
//! notifications to the active session. The streaming SDK reports background
//! transitions through its own delegate, so the same signals may also be
//! synthesized by the SDK adapter.

use serde::{Deserialize, Serialize};

/// Reason attached to an audio route change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteChangeReason {
    /// The previous output device went away (headphones unplugged, Bluetooth lost).
    OldDeviceUnavailable,
    /// A new output device became available.
    NewDeviceAvailable,
    /// The audio category changed.
    CategoryChange,
    /// Any other reason reported by the platform.
    Other,
}

/// Environmental signal delivered to a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EnvironmentSignal {
    RouteChanged(RouteChangeReason),
    InterruptionBegan,
    InterruptionEnded,
    EnteredBackground,
    WillEnterForeground,
}

impl EnvironmentSignal {
    /// Whether the signal belongs to the application lifecycle rather than
    /// the audio session.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            EnvironmentSignal::EnteredBackground | EnvironmentSignal::WillEnterForeground
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_classification() {
        assert!(EnvironmentSignal::EnteredBackground.is_lifecycle());
        assert!(EnvironmentSignal::WillEnterForeground.is_lifecycle());
        assert!(!EnvironmentSignal::InterruptionBegan.is_lifecycle());
        assert!(
            !EnvironmentSignal::RouteChanged(RouteChangeReason::OldDeviceUnavailable).is_lifecycle()
        );
    }

    #[test]
    fn test_signal_serialization() {
        let signal = EnvironmentSignal::RouteChanged(RouteChangeReason::OldDeviceUnavailable);
        let json = serde_json::to_string(&signal).unwrap();
        assert!(json.contains("RouteChanged"));
        let back: EnvironmentSignal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, signal);
    }
}
