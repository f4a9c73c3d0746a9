//! # Playback Listener Contract
//!
//! Callbacks a session delivers to its subscribers.
//!
//! ## Overview
//!
//! Every method has an empty default, so a listener implements only what it
//! cares about. Callbacks run synchronously on the session's control context
//! in subscription order; a listener that blocks delays every listener after
//! it and the session itself.
//!
//! ```rust
//! use core_playback::PlaybackListener;
//!
//! struct Clock;
//!
//! impl PlaybackListener for Clock {
//!     fn on_current_time(&self, seconds: f64) {
//!         println!("{seconds:.1}s");
//!     }
//! }
//! ```

use crate::error::PlaybackError;
use core_runtime::events::{EventBus, PlayerEvent};

/// Observer of a playback session.
pub trait PlaybackListener: Send + Sync {
    fn on_playing(&self) {}

    fn on_paused(&self) {}

    fn on_stopped(&self) {}

    /// The end of the media was reached and looping is off.
    fn on_finished(&self) {}

    fn on_error(&self, _error: &PlaybackError) {}

    fn on_loading_begin(&self) {}

    fn on_loading_end(&self) {}

    /// Buffered fraction of the media, always within `0.0..=1.0`.
    fn on_buffer_progress(&self, _progress: f64) {}

    fn on_total_time(&self, _seconds: f64) {}

    fn on_current_time(&self, _seconds: f64) {}

    fn on_seek_finished(&self) {}

    /// The backend confirmed the source is playable. Delivered once per
    /// prepared source.
    fn on_ready(&self) {}
}

/// Republishes every callback as a [`PlayerEvent`] on an [`EventBus`].
///
/// Events sent while the bus has no subscribers are dropped.
#[derive(Debug, Clone)]
pub struct EventBusListener {
    bus: EventBus,
}

impl EventBusListener {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    fn forward(&self, event: PlayerEvent) {
        // No subscribers is not an error for a fire-and-forget stream.
        let _ = self.bus.emit(event);
    }
}

impl PlaybackListener for EventBusListener {
    fn on_playing(&self) {
        self.forward(PlayerEvent::Playing);
    }

    fn on_paused(&self) {
        self.forward(PlayerEvent::Paused);
    }

    fn on_stopped(&self) {
        self.forward(PlayerEvent::Stopped);
    }

    fn on_finished(&self) {
        self.forward(PlayerEvent::Finished);
    }

    fn on_error(&self, error: &PlaybackError) {
        self.forward(PlayerEvent::Failed {
            message: error.to_string(),
        });
    }

    fn on_loading_begin(&self) {
        self.forward(PlayerEvent::LoadingBegan);
    }

    fn on_loading_end(&self) {
        self.forward(PlayerEvent::LoadingEnded);
    }

    fn on_buffer_progress(&self, progress: f64) {
        self.forward(PlayerEvent::BufferProgress { progress });
    }

    fn on_total_time(&self, seconds: f64) {
        self.forward(PlayerEvent::TotalTime { seconds });
    }

    fn on_current_time(&self, seconds: f64) {
        self.forward(PlayerEvent::CurrentTime { seconds });
    }

    fn on_seek_finished(&self) {
        self.forward(PlayerEvent::SeekFinished);
    }

    fn on_ready(&self) {
        self.forward(PlayerEvent::Ready);
    }
}
