//! Typed observer registries with disposable subscription handles.
//!
//! Notifications are synchronous and run on the caller's thread. Callbacks
//! are snapshotted before dispatch, so a callback may subscribe or
//! unsubscribe without deadlocking the registry.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Slots<E> {
    next_id: u64,
    callbacks: BTreeMap<u64, Callback<E>>,
}

/// Registry for one event channel.
pub struct ObserverRegistry<E> {
    slots: Arc<Mutex<Slots<E>>>,
}

impl<E: 'static> Default for ObserverRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> ObserverRegistry<E> {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots {
                next_id: 0,
                callbacks: BTreeMap::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots<E>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a callback and returns its handle.
    pub fn subscribe(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> Subscription {
        let mut slots = self.lock();
        let id = slots.next_id;
        slots.next_id += 1;
        slots.callbacks.insert(id, Arc::new(callback));

        let weak: Weak<Mutex<Slots<E>>> = Arc::downgrade(&self.slots);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(slots) = weak.upgrade() {
                    let mut slots = slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                    slots.callbacks.remove(&id);
                }
            })),
        }
    }

    /// Calls every registered callback in subscription order.
    pub fn notify(&self, event: &E) {
        let callbacks: Vec<Callback<E>> = self.lock().callbacks.values().cloned().collect();
        for callback in callbacks {
            callback(event);
        }
    }

    /// Number of active subscriptions.
    pub fn len(&self) -> usize {
        self.lock().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all subscriptions; outstanding handles become inert.
    pub fn clear(&self) {
        self.lock().callbacks.clear();
    }
}

/// Handle returned by [`ObserverRegistry::subscribe`].
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to remove it. Unsubscribing twice, or after
/// the registry is gone, is a no-op.
#[must_use = "keep the handle to be able to unsubscribe"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }

    /// `false` once the handle has been used.
    pub fn is_active(&self) -> bool {
        self.remove.is_some()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
