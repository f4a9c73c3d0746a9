//! Callback sink used by native backends to report asynchronous signals.
//!
//! Native engines call back from their own threads or queues. The core passes a
//! sink into each backend when it is created; the sink is responsible for
//! marshaling the signal onto the owning session's control context, so
//! implementations must be cheap and never block.

/// Receiver of backend signals of type `S`.
pub trait SignalSink<S>: Send + Sync {
    fn emit(&self, signal: S);
}

