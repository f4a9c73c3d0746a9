//! # Observer Registry
//!
//! Weakly held listeners with identity-based deduplication.
//!
//! ## Overview
//!
//! The registry never keeps a listener alive. Entries whose target has been
//! dropped are pruned on every subscribe and broadcast, so the registry only
//! grows with live listeners. Identity is the address of the shared
//! allocation: subscribing the same `Arc` twice is a no-op.

use std::fmt;
use std::sync::{Arc, Weak};

/// Ordered set of weak listener references.
pub struct ObserverRegistry<T: ?Sized> {
    entries: Vec<Weak<T>>,
}

impl<T: ?Sized> ObserverRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds `listener` unless it is already present or already dropped.
    ///
    /// Returns `true` if the listener was added.
    pub fn subscribe(&mut self, listener: Weak<T>) -> bool {
        self.prune();
        if listener.strong_count() == 0 || self.contains(&listener) {
            return false;
        }
        self.entries.push(listener);
        true
    }

    /// Removes `listener`. Returns `true` if it was present.
    pub fn unsubscribe(&mut self, listener: &Weak<T>) -> bool {
        let before = self.entries.len();
        let target = addr(listener);
        self.entries.retain(|entry| addr(entry) != target);
        self.prune();
        self.entries.len() != before
    }

    pub fn contains(&self, listener: &Weak<T>) -> bool {
        let target = addr(listener);
        self.entries.iter().any(|entry| addr(entry) == target)
    }

    /// Drops entries whose listener no longer exists.
    pub fn prune(&mut self) {
        self.entries.retain(|entry| entry.strong_count() > 0);
    }

    /// Invokes `notify` for every live listener in subscription order.
    ///
    /// Listeners are upgraded up front, so one dropped mid-broadcast still
    /// receives this round. Returns the number of listeners notified.
    pub fn broadcast<F>(&mut self, mut notify: F) -> usize
    where
        F: FnMut(&T),
    {
        self.prune();
        let live: Vec<Arc<T>> = self.entries.iter().filter_map(Weak::upgrade).collect();
        for listener in &live {
            notify(listener.as_ref());
        }
        live.len()
    }

    /// Number of entries, including any not yet pruned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn addr<T: ?Sized>(weak: &Weak<T>) -> *const () {
    weak.as_ptr().cast::<()>()
}

impl<T: ?Sized> Default for ObserverRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for ObserverRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    struct Listener(&'static str);

    impl Named for Listener {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn weak(listener: &Arc<Listener>) -> Weak<dyn Named> {
        let listener: Arc<dyn Named> = listener.clone();
        Arc::downgrade(&listener)
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let mut registry: ObserverRegistry<dyn Named> = ObserverRegistry::new();
        let a = Arc::new(Listener("a"));

        assert!(registry.subscribe(weak(&a)));
        assert!(!registry.subscribe(weak(&a)));
        assert_eq!(registry.len(), 1);

        let mut calls = 0;
        assert_eq!(registry.broadcast(|_| calls += 1), 1);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_broadcast_in_subscription_order() {
        let mut registry: ObserverRegistry<dyn Named> = ObserverRegistry::new();
        let a = Arc::new(Listener("a"));
        let b = Arc::new(Listener("b"));
        let c = Arc::new(Listener("c"));
        registry.subscribe(weak(&b));
        registry.subscribe(weak(&a));
        registry.subscribe(weak(&c));

        let seen = Mutex::new(Vec::new());
        registry.broadcast(|l| seen.lock().push(l.name().to_string()));
        assert_eq!(*seen.lock(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let mut registry: ObserverRegistry<dyn Named> = ObserverRegistry::new();
        let a = Arc::new(Listener("a"));
        let b = Arc::new(Listener("b"));
        registry.subscribe(weak(&a));
        registry.subscribe(weak(&b));
        drop(a);

        let mut names = Vec::new();
        let notified = registry.broadcast(|l| names.push(l.name().to_string()));
        assert_eq!(notified, 1);
        assert_eq!(names, vec!["b"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let mut registry: ObserverRegistry<dyn Named> = ObserverRegistry::new();
        let a = Arc::new(Listener("a"));
        registry.subscribe(weak(&a));

        assert!(registry.unsubscribe(&weak(&a)));
        assert!(!registry.unsubscribe(&weak(&a)));
        assert!(registry.is_empty());
        assert_eq!(registry.broadcast(|_| {}), 0);
    }

    #[test]
    fn test_subscribe_dropped_listener_is_rejected() {
        let mut registry: ObserverRegistry<dyn Named> = ObserverRegistry::new();
        let gone = weak(&Arc::new(Listener("gone")));
        assert!(!registry.subscribe(gone));
        assert!(registry.is_empty());
    }
}
