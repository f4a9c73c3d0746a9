//! # Event Bus System
//!
//! Broadcasts playback events to asynchronous consumers using
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! Listener objects are the primary way to observe a playback session. Hosts
//! that would rather consume a stream (a UI framework with its own event loop,
//! an analytics pipeline, an FFI boundary that serializes to JSON) can attach
//! a forwarding listener that republishes every callback as a [`PlayerEvent`]
//! on an [`EventBus`].
//!
//! ```text
//! ┌─────────────────┐  listener   ┌──────────────┐  emit  ┌──────────┐  subscribe  ┌────────────┐
//! │ PlaybackSession ├────────────>│ bus listener ├───────>│ EventBus ├────────────>│ Subscriber │
//! └─────────────────┘             └──────────────┘        └──────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, PlayerEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(64);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(PlayerEvent::Playing).ok();
//! assert_eq!(rx.recv().await.unwrap(), PlayerEvent::Playing);
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast::{self, error::RecvError, error::SendError, Receiver};

/// Default number of buffered events per subscriber.
///
/// Periodic time updates arrive at 10 Hz, so this covers several seconds of a
/// stalled consumer.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

/// Playback event published on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum PlayerEvent {
    Playing,
    Paused,
    Stopped,
    Finished,
    Failed { message: String },
    LoadingBegan,
    LoadingEnded,
    Ready,
    BufferProgress { progress: f64 },
    TotalTime { seconds: f64 },
    CurrentTime { seconds: f64 },
    SeekFinished,
}

impl PlayerEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &'static str {
        match self {
            PlayerEvent::Playing => "Playback started",
            PlayerEvent::Paused => "Playback paused",
            PlayerEvent::Stopped => "Playback stopped",
            PlayerEvent::Finished => "Reached end of media",
            PlayerEvent::Failed { .. } => "Playback failed",
            PlayerEvent::LoadingBegan => "Buffering",
            PlayerEvent::LoadingEnded => "Buffering finished",
            PlayerEvent::Ready => "Media ready",
            PlayerEvent::BufferProgress { .. } => "Buffer progress updated",
            PlayerEvent::TotalTime { .. } => "Duration updated",
            PlayerEvent::CurrentTime { .. } => "Playback time updated",
            PlayerEvent::SeekFinished => "Seek finished",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            PlayerEvent::Failed { .. } => EventSeverity::Error,
            PlayerEvent::BufferProgress { .. }
            | PlayerEvent::CurrentTime { .. }
            | PlayerEvent::TotalTime { .. } => EventSeverity::Debug,
            _ => EventSeverity::Info,
        }
    }

    /// Whether the event reports a state transition rather than telemetry.
    pub fn is_state_change(&self) -> bool {
        matches!(
            self,
            PlayerEvent::Playing
                | PlayerEvent::Paused
                | PlayerEvent::Stopped
                | PlayerEvent::Finished
                | PlayerEvent::Failed { .. }
        )
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for [`PlayerEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// A subscriber that falls behind by more than `capacity` events receives
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// when nobody is subscribed.
    pub fn emit(&self, event: PlayerEvent) -> Result<usize, SendError<PlayerEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&PlayerEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, PlayerEvent};
///
/// let bus = EventBus::new(16);
/// let stream = EventStream::new(bus.subscribe()).filter(PlayerEvent::is_state_change);
/// ```
pub struct EventStream {
    receiver: Receiver<PlayerEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<PlayerEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by [`recv`](Self::recv).
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&PlayerEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<PlayerEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without waiting.
    ///
    /// Returns `None` if no matching events are currently buffered.
    pub fn try_recv(&mut self) -> Option<Result<PlayerEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}
