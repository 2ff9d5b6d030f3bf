use serde_json::Value;
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, PoisonError, Weak},
};
use tracing::debug;
use uuid::Uuid;

/// Callback invoked with the payload of a native event
pub type Listener = Arc<dyn Fn(Value) + Send + Sync>;

/// A registered native event listener
///
/// Removing is the only operation; a removed handle is consumed.
pub trait Subscription: Send + Sync {
    /// Unique handle id
    fn id(&self) -> Uuid;

    /// Channel the listener is attached to
    fn channel(&self) -> &str;

    /// Detach the listener
    fn remove(self: Box<Self>);
}

type ListenerMap = HashMap<String, Vec<(Uuid, Listener)>>;

/// Channel-keyed event dispatcher
///
/// Native bridge implementations use it to hand platform events to the
/// listeners the facade installs.
#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: Arc<Mutex<ListenerMap>>,
}

impl EventEmitter {
    /// Create an emitter without listeners
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener to a channel
    #[must_use]
    pub fn add_listener(&self, channel: &str, listener: Listener) -> EmitterSubscription {
        let id = Uuid::new_v4();
        self.lock()
            .entry(channel.to_string())
            .or_default()
            .push((id, listener));

        debug!("Listener {} added on {}", id, channel);

        EmitterSubscription {
            id,
            channel: channel.to_string(),
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Deliver a payload to every listener on a channel
    ///
    /// Returns the number of listeners invoked. Listeners run outside the
    /// internal lock, so they may add or remove subscriptions.
    pub fn emit(&self, channel: &str, payload: &Value) -> usize {
        let listeners: Vec<Listener> = self
            .lock()
            .get(channel)
            .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();

        for listener in &listeners {
            listener(payload.clone());
        }

        listeners.len()
    }

    /// Number of listeners on a channel
    #[must_use]
    pub fn listener_count(&self, channel: &str) -> usize {
        self.lock().get(channel).map_or(0, Vec::len)
    }

    /// Number of listeners across all channels
    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ListenerMap> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.total_listeners())
            .finish()
    }
}

/// Handle to a listener registered on an [`EventEmitter`]
#[derive(Debug)]
pub struct EmitterSubscription {
    id: Uuid,
    channel: String,
    listeners: Weak<Mutex<ListenerMap>>,
}

impl Subscription for EmitterSubscription {
    fn id(&self) -> Uuid {
        self.id
    }

    fn channel(&self) -> &str {
        &self.channel
    }

    fn remove(self: Box<Self>) {
        let Some(listeners) = self.listeners.upgrade() else {
            return;
        };
        let mut listeners = listeners.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entries) = listeners.get_mut(&self.channel) {
            entries.retain(|(id, _)| *id != self.id);
            if entries.is_empty() {
                listeners.remove(&self.channel);
            }
        }
        debug!("Listener {} removed from {}", self.id, self.channel);
    }
}

/// Ordered collection of the subscriptions a facade owns
#[derive(Default)]
pub struct SubscriptionRegistry {
    handles: Vec<Box<dyn Subscription>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a subscription
    pub fn push(&mut self, subscription: Box<dyn Subscription>) {
        self.handles.push(subscription);
    }

    /// Number of live subscriptions
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no subscription is held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Remove every subscription and clear the registry
    ///
    /// Returns how many were removed.
    pub fn remove_all(&mut self) -> usize {
        let handles = std::mem::take(&mut self.handles);
        let count = handles.len();
        for handle in handles {
            handle.remove();
        }
        count
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.handles.iter().map(|h| (h.channel(), h.id())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_listener(counter: &Arc<AtomicUsize>) -> Listener {
        let counter = Arc::clone(counter);
        Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_emit_reaches_channel_listeners_only() {
        let emitter = EventEmitter::new();
        let steps = Arc::new(AtomicUsize::new(0));
        let history = Arc::new(AtomicUsize::new(0));

        let _a = emitter.add_listener("StepChangedEvent", counting_listener(&steps));
        let _b = emitter.add_listener("StepChangedEvent", counting_listener(&steps));
        let _c = emitter.add_listener("StepHistoryChangedEvent", counting_listener(&history));

        assert_eq!(emitter.emit("StepChangedEvent", &json!({ "steps": 12 })), 2);
        assert_eq!(steps.load(Ordering::SeqCst), 2);
        assert_eq!(history.load(Ordering::SeqCst), 0);
        assert_eq!(emitter.emit("Nobody", &Value::Null), 0);
    }

    #[test]
    fn test_subscription_remove_detaches_listener() {
        let emitter = EventEmitter::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let first = emitter.add_listener("STEP_RECORDING", counting_listener(&counter));
        let second = emitter.add_listener("STEP_RECORDING", counting_listener(&counter));
        assert_ne!(first.id(), second.id());
        assert_eq!(emitter.listener_count("STEP_RECORDING"), 2);

        Box::new(first).remove();
        emitter.emit("STEP_RECORDING", &json!({ "recording": true }));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.listener_count("STEP_RECORDING"), 1);
    }

    #[test]
    fn test_registry_remove_all_clears_everything() {
        let emitter = EventEmitter::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = SubscriptionRegistry::new();

        for channel in ["StepChangedEvent", "StepChangedEvent", "DISTANCE_RECORDING"] {
            registry.push(Box::new(
                emitter.add_listener(channel, counting_listener(&counter)),
            ));
        }
        assert_eq!(registry.len(), 3);
        assert_eq!(emitter.total_listeners(), 3);

        assert_eq!(registry.remove_all(), 3);
        assert!(registry.is_empty());
        assert_eq!(emitter.total_listeners(), 0);
        assert_eq!(registry.remove_all(), 0);
    }

    #[test]
    fn test_remove_after_emitter_dropped_is_noop() {
        let emitter = EventEmitter::new();
        let subscription = emitter.add_listener("StepChangedEvent", Arc::new(|_| {}));
        drop(emitter);
        Box::new(subscription).remove();
    }
}
