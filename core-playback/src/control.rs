//! # Control Inbox
//!
//! Everything that reaches a session from outside its owner arrives here:
//! backend events from engine threads, transport commands from other threads
//! and host lifecycle notifications.
//!
//! ## Overview
//!
//! A [`SessionHandle`] is a cheap, cloneable, thread-safe front for a
//! [`PlaybackSession`](crate::PlaybackSession). Its verbs enqueue a message
//! and return immediately; the session applies them the next time its owner
//! drains the inbox with `pump()` or `process_next()`. Reads go to a shared
//! [`TelemetrySnapshot`] and never wait on the session.

use crate::engine::EngineEvent;
use crate::state::{PlaybackSessionId, PlaybackState, TelemetrySnapshot};
use bridge_traits::EnvironmentSignal;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::UnboundedSender;

/// Seek completion callback.
pub type SeekCompletion = Box<dyn FnOnce() + Send + 'static>;

pub(crate) enum ControlMessage {
    Engine { epoch: u64, event: EngineEvent },
    Command(Command),
    Environment(EnvironmentSignal),
}

pub(crate) enum Command {
    Play,
    Pause,
    Stop,
    Seek { to: f64, completion: SeekCompletion },
}

impl fmt::Debug for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlMessage::Engine { epoch, event } => f
                .debug_struct("Engine")
                .field("epoch", epoch)
                .field("event", event)
                .finish(),
            ControlMessage::Command(command) => f.debug_tuple("Command").field(command).finish(),
            ControlMessage::Environment(signal) => {
                f.debug_tuple("Environment").field(signal).finish()
            }
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Play => f.write_str("Play"),
            Command::Pause => f.write_str("Pause"),
            Command::Stop => f.write_str("Stop"),
            Command::Seek { to, .. } => f.debug_struct("Seek").field("to", to).finish(),
        }
    }
}

/// Thread-safe handle to a playback session.
#[derive(Clone)]
pub struct SessionHandle {
    id: PlaybackSessionId,
    sender: UnboundedSender<ControlMessage>,
    snapshot: Arc<RwLock<TelemetrySnapshot>>,
}

impl SessionHandle {
    pub(crate) fn new(
        id: PlaybackSessionId,
        sender: UnboundedSender<ControlMessage>,
        snapshot: Arc<RwLock<TelemetrySnapshot>>,
    ) -> Self {
        Self {
            id,
            sender,
            snapshot,
        }
    }

    pub fn id(&self) -> PlaybackSessionId {
        self.id
    }

    /// Requests playback. Returns `false` if the session no longer exists.
    pub fn play(&self) -> bool {
        self.send(ControlMessage::Command(Command::Play))
    }

    pub fn pause(&self) -> bool {
        self.send(ControlMessage::Command(Command::Pause))
    }

    pub fn stop(&self) -> bool {
        self.send(ControlMessage::Command(Command::Stop))
    }

    /// Requests a seek to `to` seconds.
    ///
    /// `on_complete` always runs exactly once: on the session's control
    /// context when the seek is handled, or right here if the session is
    /// gone.
    pub fn seek<F>(&self, to: f64, on_complete: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let message = ControlMessage::Command(Command::Seek {
            to,
            completion: Box::new(on_complete),
        });
        match self.sender.send(message) {
            Ok(()) => true,
            Err(SendError(ControlMessage::Command(Command::Seek { completion, .. }))) => {
                completion();
                false
            }
            Err(_) => false,
        }
    }

    /// Forwards a host lifecycle notification (route change, interruption,
    /// background/foreground).
    pub fn notify_environment(&self, signal: EnvironmentSignal) -> bool {
        self.send(ControlMessage::Environment(signal))
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.snapshot.read().clone()
    }

    pub fn state(&self) -> PlaybackState {
        self.snapshot.read().state
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn send(&self, message: ControlMessage) -> bool {
        self.sender.send(message).is_ok()
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc;

    #[test]
    fn test_seek_on_closed_session_completes_inline() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SessionHandle::new(
            PlaybackSessionId::new(),
            tx,
            Arc::new(RwLock::new(TelemetrySnapshot::default())),
        );
        drop(rx);

        let completed = Arc::new(AtomicBool::new(false));
        let flag = completed.clone();
        assert!(!handle.seek(3.0, move || flag.store(true, Ordering::SeqCst)));
        assert!(completed.load(Ordering::SeqCst));
        assert!(!handle.play());
        assert!(handle.is_closed());
    }

    #[test]
    fn test_commands_are_queued_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = SessionHandle::new(
            PlaybackSessionId::new(),
            tx,
            Arc::new(RwLock::new(TelemetrySnapshot::default())),
        );

        assert!(handle.play());
        assert!(handle.seek(1.0, || {}));
        assert!(handle.notify_environment(EnvironmentSignal::InterruptionBegan));

        assert!(matches!(
            rx.try_recv(),
            Ok(ControlMessage::Command(Command::Play))
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(ControlMessage::Command(Command::Seek { to, .. })) if to == 1.0
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(ControlMessage::Environment(EnvironmentSignal::InterruptionBegan))
        ));
    }
}
