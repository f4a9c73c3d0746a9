//! Now-playing and remote command shims for desktop hosts.

use bridge_traits::{
    error::Result,
    now_playing::{NowPlayingCenter, NowPlayingInfo, RemoteCommand, RemoteCommandCenter},
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Keeps the most recently published now-playing info in memory.
///
/// Useful for desktop media overlays that poll the current info, and as a
/// recording fake in tests.
#[derive(Debug, Default)]
pub struct InMemoryNowPlayingCenter {
    current: RwLock<Option<NowPlayingInfo>>,
    publish_count: Mutex<u64>,
}

impl InMemoryNowPlayingCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last published info, `None` after [`NowPlayingCenter::clear`].
    pub fn current(&self) -> Option<NowPlayingInfo> {
        self.current.read().clone()
    }

    pub fn publish_count(&self) -> u64 {
        *self.publish_count.lock()
    }
}

impl NowPlayingCenter for InMemoryNowPlayingCenter {
    fn publish(&self, info: &NowPlayingInfo) -> Result<()> {
        trace!(elapsed = ?info.elapsed, duration = ?info.duration, rate = info.rate, "Now playing updated");
        *self.current.write() = Some(info.clone());
        *self.publish_count.lock() += 1;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        debug!("Now playing cleared");
        *self.current.write() = None;
        Ok(())
    }
}

/// Tracks which remote commands are enabled.
#[derive(Debug, Default)]
pub struct DesktopRemoteCommandCenter {
    enabled: Mutex<HashSet<RemoteCommand>>,
    receiving: Mutex<bool>,
}

impl DesktopRemoteCommandCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self, command: RemoteCommand) -> bool {
        self.enabled.lock().contains(&command)
    }

    pub fn is_receiving(&self) -> bool {
        *self.receiving.lock()
    }
}

impl RemoteCommandCenter for DesktopRemoteCommandCenter {
    fn set_enabled(&self, command: RemoteCommand, enabled: bool) -> Result<()> {
        debug!(?command, enabled, "Remote command toggled");
        let mut set = self.enabled.lock();
        if enabled {
            set.insert(command);
        } else {
            set.remove(&command);
        }
        Ok(())
    }

    fn set_receiving(&self, receiving: bool) -> Result<()> {
        *self.receiving.lock() = receiving;
        Ok(())
    }
}
