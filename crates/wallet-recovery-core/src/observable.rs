use std::sync::{Arc, Mutex, Weak};

type Listener<T> = Box<dyn FnMut(&T) + Send>;

struct ListenerSlot<T> {
    id: u64,
    listener: Listener<T>,
}

struct Registry<T> {
    next_id: u64,
    slots: Vec<ListenerSlot<T>>,
}

/// Single-value publish/subscribe holder. `set` replaces the whole value and
/// then fans out to subscribers, so readers never observe a partial update.
///
/// Listeners are invoked outside the value lock but under the listener
/// registry lock; a listener must not subscribe or set on the same
/// observable from within its own callback.
pub struct Observable<T> {
    value: Arc<Mutex<T>>,
    listeners: Arc<Mutex<Registry<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            listeners: Arc::clone(&self.listeners),
        }
    }
}

/// Handle returned by `subscribe`; detaches the listener when consumed.
/// Dropping the handle without calling `unsubscribe` leaves the listener
/// attached for the lifetime of the observable.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl<T: Clone + Send + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(Mutex::new(value)),
            listeners: Arc::new(Mutex::new(Registry {
                next_id: 0,
                slots: Vec::new(),
            })),
        }
    }

    pub fn get(&self) -> T {
        self.value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set(&self, value: T) {
        {
            let mut guard = self
                .value
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard = value.clone();
        }
        let mut registry = self
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for slot in registry.slots.iter_mut() {
            (slot.listener)(&value);
        }
    }

    pub fn subscribe(&self, listener: impl FnMut(&T) + Send + 'static) -> Subscription {
        let id = {
            let mut registry = self
                .listeners
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let id = registry.next_id;
            registry.next_id += 1;
            registry.slots.push(ListenerSlot {
                id,
                listener: Box::new(listener),
            });
            id
        };
        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.listeners);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(listeners) = weak.upgrade() {
                    let mut registry = listeners
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    registry.slots.retain(|slot| slot.id != id);
                }
            })),
        }
    }

    /// Subscribe and synchronously invoke once with the current value.
    pub fn subscribe_now(&self, mut listener: impl FnMut(&T) + Send + 'static) -> Subscription {
        let current = self.get();
        listener(&current);
        self.subscribe(listener)
    }
}
