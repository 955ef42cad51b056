//! Event sink port and the listener-set implementation.
//!
//! The engine emits through `DownloadEventSink`; `ListenerSet` is the
//! production implementation, an explicit observer set so multiple
//! independent UI surfaces can subscribe and unsubscribe safely. Emission
//! never blocks and never fails.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::DownloadEvent;

/// Trait for receiving download events.
pub trait EventListener: Send + Sync {
    /// Called for every emitted event. Must not block.
    fn on_event(&self, event: &DownloadEvent);
}

/// Blanket impl so plain closures can subscribe.
impl<F> EventListener for F
where
    F: Fn(&DownloadEvent) + Send + Sync,
{
    fn on_event(&self, event: &DownloadEvent) {
        self(event);
    }
}

/// Port the download engine emits through.
pub trait DownloadEventSink: Send + Sync {
    /// Emit an event to whoever is listening.
    fn emit(&self, event: DownloadEvent);
}

/// Handle returned by `ListenerSet::register`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A registerable set of event listeners.
#[derive(Default)]
pub struct ListenerSet {
    listeners: RwLock<Vec<(u64, Arc<dyn EventListener>)>>,
    next_id: AtomicU64,
}

impl ListenerSet {
    /// Create an empty listener set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; returns a handle for unregistering.
    pub fn register(&self, listener: Arc<dyn EventListener>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .expect("listener set poisoned")
            .push((id, listener));
        SubscriptionId(id)
    }

    /// Remove a listener. Returns false if the handle was already removed.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write().expect("listener set poisoned");
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id.0);
        listeners.len() != before
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.read().expect("listener set poisoned").len()
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DownloadEventSink for ListenerSet {
    fn emit(&self, event: DownloadEvent) {
        // Snapshot under the lock, call listeners outside it so a listener
        // can register or unregister from inside its callback.
        let snapshot: Vec<Arc<dyn EventListener>> = self
            .listeners
            .read()
            .expect("listener set poisoned")
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in snapshot {
            listener.on_event(&event);
        }
    }
}

/// A sink that discards all events, for tests and headless callers.
#[derive(Debug, Clone, Default)]
pub struct NoopSink;

impl NoopSink {
    /// Create a new no-op sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DownloadEventSink for NoopSink {
    fn emit(&self, _event: DownloadEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl EventListener for Recorder {
        fn on_event(&self, event: &DownloadEvent) {
            self.seen.lock().unwrap().push(event.message.clone());
        }
    }

    #[test]
    fn emit_reaches_all_listeners() {
        let set = ListenerSet::new();
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        set.register(Arc::clone(&first) as Arc<dyn EventListener>);
        set.register(Arc::clone(&second) as Arc<dyn EventListener>);

        set.emit(DownloadEvent::campaign_started("go"));

        assert_eq!(first.seen.lock().unwrap().as_slice(), ["go"]);
        assert_eq!(second.seen.lock().unwrap().as_slice(), ["go"]);
    }

    #[test]
    fn unregister_stops_delivery() {
        let set = ListenerSet::new();
        let recorder = Arc::new(Recorder::default());
        let id = set.register(Arc::clone(&recorder) as Arc<dyn EventListener>);

        assert!(set.unregister(id));
        assert!(!set.unregister(id));

        set.emit(DownloadEvent::campaign_started("ignored"));
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn closures_can_listen() {
        let set = ListenerSet::new();
        let count = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&count);
        set.register(Arc::new(move |_: &DownloadEvent| {
            counter.fetch_add(1, Ordering::Relaxed);
        }));

        set.emit(DownloadEvent::campaign_started("one"));
        set.emit(DownloadEvent::completed("two", None));
        assert_eq!(count.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn noop_sink_discards() {
        NoopSink::new().emit(DownloadEvent::campaign_started("nothing"));
    }
}
