//! Subscriber registry
//!
//! Three independent channels (state, progress, error). Delivery is
//! synchronous and in subscription order, against a snapshot of the listener
//! list taken when the emission starts. A listener may therefore unsubscribe
//! itself, or anyone else, from inside its own callback.

use cadence_core::{PlayerState, ProgressInfo};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Receives player notifications
///
/// Every method defaults to a no-op so an observer only implements the
/// signals it cares about.
pub trait PlayerObserver: Send + Sync {
    /// A new state snapshot
    fn on_state_change(&self, _state: &PlayerState) {}

    /// A position update from the sampler or a seek
    fn on_progress(&self, _progress: &ProgressInfo) {}

    /// A transient, human-readable error
    fn on_error(&self, _message: &str) {}
}

/// Handle returned by subscribe calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub(crate) type StateListener = dyn Fn(&PlayerState) + Send + Sync;
pub(crate) type ProgressListener = dyn Fn(&ProgressInfo) + Send + Sync;
pub(crate) type ErrorListener = dyn Fn(&str) + Send + Sync;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ordered listener list for one signal
pub(crate) struct Channel<T: ?Sized> {
    listeners: Mutex<Vec<(SubscriptionId, Arc<T>)>>,
}

impl<T: ?Sized> Channel<T> {
    fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn add(&self, id: SubscriptionId, listener: Arc<T>) {
        lock(&self.listeners).push((id, listener));
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Listeners at this instant; the lock is released before delivery
    fn snapshot(&self) -> Vec<Arc<T>> {
        lock(&self.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    fn len(&self) -> usize {
        lock(&self.listeners).len()
    }

    fn clear(&self) {
        lock(&self.listeners).clear();
    }
}

/// Fan-out over the three channels
pub struct Notifier {
    next_id: AtomicU64,
    /// Observer identity (data pointer) per subscription
    observers: Mutex<Vec<(SubscriptionId, usize)>>,
    state: Channel<StateListener>,
    progress: Channel<ProgressListener>,
    errors: Channel<ErrorListener>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            observers: Mutex::new(Vec::new()),
            state: Channel::new(),
            progress: Channel::new(),
            errors: Channel::new(),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register `observer` on all three channels
    ///
    /// Returns the subscription id and whether it is new. Registering the
    /// same `Arc` again returns the existing id.
    pub fn subscribe(&self, observer: Arc<dyn PlayerObserver>) -> (SubscriptionId, bool) {
        let identity = Arc::as_ptr(&observer).cast::<()>() as usize;

        let mut observers = lock(&self.observers);
        if let Some((id, _)) = observers.iter().find(|(_, existing)| *existing == identity) {
            return (*id, false);
        }

        let id = self.next_id();
        let on_state = Arc::clone(&observer);
        self.state
            .add(id, Arc::new(move |state: &PlayerState| on_state.on_state_change(state)));
        let on_progress = Arc::clone(&observer);
        self.progress
            .add(id, Arc::new(move |progress: &ProgressInfo| on_progress.on_progress(progress)));
        self.errors
            .add(id, Arc::new(move |message: &str| observer.on_error(message)));

        observers.push((id, identity));
        (id, true)
    }

    pub fn on_state_change<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&PlayerState) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.state.add(id, Arc::new(listener));
        id
    }

    pub fn on_progress<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ProgressInfo) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.progress.add(id, Arc::new(listener));
        id
    }

    pub fn on_error<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.errors.add(id, Arc::new(listener));
        id
    }

    /// Remove a subscription from every channel; unknown ids are ignored
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        lock(&self.observers).retain(|(existing, _)| *existing != id);
        let state = self.state.remove(id);
        let progress = self.progress.remove(id);
        let errors = self.errors.remove(id);
        state || progress || errors
    }

    pub fn emit_state(&self, state: &PlayerState) {
        for listener in self.state.snapshot() {
            listener(state);
        }
    }

    pub fn emit_progress(&self, progress: &ProgressInfo) {
        for listener in self.progress.snapshot() {
            listener(progress);
        }
    }

    pub fn emit_error(&self, message: &str) {
        for listener in self.errors.snapshot() {
            listener(message);
        }
    }

    /// Listener counts as (state, progress, error)
    pub fn listener_counts(&self) -> (usize, usize, usize) {
        (self.state.len(), self.progress.len(), self.errors.len())
    }

    /// Drop every subscription
    pub fn clear(&self) {
        lock(&self.observers).clear();
        self.state.clear();
        self.progress.clear();
        self.errors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counter {
        states: AtomicUsize,
        errors: Mutex<Vec<String>>,
    }

    impl PlayerObserver for Counter {
        fn on_state_change(&self, _state: &PlayerState) {
            self.states.fetch_add(1, Ordering::SeqCst);
        }

        fn on_error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn same_observer_subscribes_once() {
        let notifier = Notifier::new();
        let counter = Arc::new(Counter::default());

        let (first, fresh) = notifier.subscribe(counter.clone());
        assert!(fresh);
        let (second, fresh) = notifier.subscribe(counter.clone());
        assert!(!fresh);
        assert_eq!(first, second);

        notifier.emit_state(&PlayerState::default());
        assert_eq!(counter.states.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let notifier = Notifier::new();
        let counter = Arc::new(Counter::default());
        let (id, _) = notifier.subscribe(counter.clone());

        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.emit_state(&PlayerState::default());
        assert_eq!(counter.states.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.listener_counts(), (0, 0, 0));

        // Can come back after leaving
        let (_, fresh) = notifier.subscribe(counter);
        assert!(fresh);
    }

    #[test]
    fn default_methods_ignore_other_signals() {
        let notifier = Notifier::new();
        let counter = Arc::new(Counter::default());
        notifier.subscribe(counter.clone());

        notifier.emit_progress(&ProgressInfo::new(1.0, 2.0));
        notifier.emit_error("Playback error: boom");
        assert_eq!(counter.states.load(Ordering::SeqCst), 0);
        assert_eq!(*counter.errors.lock().unwrap(), vec!["Playback error: boom"]);
    }

    #[test]
    fn delivery_follows_subscription_order() {
        let notifier = Notifier::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let order = Arc::clone(&order);
            notifier.on_error(move |_| order.lock().unwrap().push(n));
        }

        notifier.emit_error("x");
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn unsubscribing_inside_callback_is_safe() {
        let notifier = Arc::new(Notifier::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let own_id = Arc::new(Mutex::new(None));

        let id = {
            let notifier_ref = Arc::downgrade(&notifier);
            let calls = Arc::clone(&calls);
            let own_id = Arc::clone(&own_id);
            notifier.on_state_change(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                if let (Some(notifier), Some(id)) = (notifier_ref.upgrade(), *own_id.lock().unwrap())
                {
                    notifier.unsubscribe(id);
                }
            })
        };
        *own_id.lock().unwrap() = Some(id);

        let later = Arc::new(AtomicUsize::new(0));
        let later_calls = Arc::clone(&later);
        notifier.on_state_change(move |_| {
            later_calls.fetch_add(1, Ordering::SeqCst);
        });

        notifier.emit_state(&PlayerState::default());
        notifier.emit_state(&PlayerState::default());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(later.load(Ordering::SeqCst), 2);
    }
}
