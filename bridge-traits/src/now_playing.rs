//! System now-playing info and remote transport commands.
//!
//! The lock screen, control center and external accessories read the
//! now-playing dictionary and send play/pause commands back. The core writes
//! [`NowPlayingInfo`] through [`NowPlayingCenter`] and registers/unregisters
//! the transport commands through [`RemoteCommandCenter`].

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Static metadata describing the prepared item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Artwork location. Fetching and formatting the image is up to the host.
    pub artwork_url: Option<String>,
    pub asset_url: Option<String>,
}

impl MediaMetadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_artwork_url(mut self, url: impl Into<String>) -> Self {
        self.artwork_url = Some(url.into());
        self
    }

    pub fn with_asset_url(mut self, url: impl Into<String>) -> Self {
        self.asset_url = Some(url.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Audio,
    Video,
}

/// Full now-playing dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingInfo {
    pub metadata: MediaMetadata,
    pub media_type: MediaType,
    /// Seconds.
    pub duration: Option<f64>,
    /// Seconds.
    pub elapsed: Option<f64>,
    pub rate: f32,
    pub default_rate: f32,
}

impl NowPlayingInfo {
    pub fn video(metadata: MediaMetadata) -> Self {
        Self {
            metadata,
            media_type: MediaType::Video,
            duration: None,
            elapsed: None,
            rate: 0.0,
            default_rate: 1.0,
        }
    }
}

/// Writer for the system now-playing dictionary.
#[cfg_attr(test, mockall::automock)]
pub trait NowPlayingCenter: Send + Sync {
    /// Replace the whole dictionary.
    fn publish(&self, info: &NowPlayingInfo) -> Result<()>;

    /// Remove any published info.
    fn clear(&self) -> Result<()>;
}

/// Transport commands the core can receive from the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteCommand {
    Play,
    Pause,
}

/// Status returned to the system for a handled remote command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteCommandStatus {
    Success,
    /// Nothing is loaded that the command could apply to.
    NoSuchContent,
    CommandFailed,
}

/// Registration point for remote transport commands.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteCommandCenter: Send + Sync {
    fn set_enabled(&self, command: RemoteCommand, enabled: bool) -> Result<()>;

    /// Begin or end receiving remote control events for the process.
    fn set_receiving(&self, receiving: bool) -> Result<()>;
}
