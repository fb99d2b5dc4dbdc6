//! Callback registries for the facade event streams.
//!
//! Each facade stream is a [`Registry`]: subscribers are stored in
//! registration order and every notification walks them in that order.
//! Subscribing hands back a [`Subscription`] handle; dropping it (or calling
//! `unsubscribe`) removes the callback so it receives nothing further.

use std::sync::{Arc, Mutex, Weak};

type Callback<T> = Box<dyn FnMut(&T) + Send>;

struct Slot<T> {
    id: u64,
    callback: Callback<T>,
}

struct RegistryInner<T> {
    next_id: u64,
    slots: Vec<Slot<T>>,
}

/// An ordered list of callbacks sharing one payload type.
pub struct Registry<T> {
    inner: Arc<Mutex<RegistryInner<T>>>,
}

impl<T> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Registry {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Registry {
            inner: Arc::new(Mutex::new(RegistryInner {
                next_id: 0,
                slots: Vec::new(),
            })),
        }
    }

    /// Register a callback. The returned handle unsubscribes on drop.
    pub fn subscribe(&self, callback: impl FnMut(&T) + Send + 'static) -> Subscription
    where
        T: 'static,
    {
        let mut inner = crate::lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.slots.push(Slot {
            id,
            callback: Box::new(callback),
        });
        drop(inner);

        let weak = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || remove_slot(&weak, id))),
        }
    }

    /// Deliver `value` to every registered callback, in registration order.
    ///
    /// Callbacks run while the registry is locked, so a callback must not
    /// subscribe to or unsubscribe from the registry it was delivered by.
    pub fn notify(&self, value: &T) {
        let mut inner = crate::lock(&self.inner);
        for slot in &mut inner.slots {
            (slot.callback)(value);
        }
    }

    /// Drop every registered callback.
    pub fn clear(&self) {
        crate::lock(&self.inner).slots.clear();
    }

    pub fn len(&self) -> usize {
        crate::lock(&self.inner).slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_slot<T>(registry: &Weak<Mutex<RegistryInner<T>>>, id: u64) {
    if let Some(inner) = registry.upgrade() {
        crate::lock(&inner).slots.retain(|slot| slot.id != id);
    }
}

/// Handle for a registered callback.
///
/// Unsubscribes when dropped; only holds a weak reference, so it cannot keep
/// a disconnected facade alive.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Remove the callback now instead of waiting for drop.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_registration_order() {
        let registry: Registry<u32> = Registry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = seen.clone();
        let _a = registry.subscribe(move |v| first.lock().unwrap().push(("a", *v)));
        let second = seen.clone();
        let _b = registry.subscribe(move |v| second.lock().unwrap().push(("b", *v)));

        registry.notify(&7);

        assert_eq!(*seen.lock().unwrap(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn unsubscribe_stops_all_further_deliveries() {
        let registry: Registry<u32> = Registry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let sub = registry.subscribe(move |v| sink.lock().unwrap().push(*v));
        registry.notify(&1);
        sub.unsubscribe();
        registry.notify(&2);
        registry.notify(&3);

        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert!(registry.is_empty());
    }

    #[test]
    fn dropping_the_handle_unsubscribes() {
        let registry: Registry<u32> = Registry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        {
            let _sub = registry.subscribe(move |v| sink.lock().unwrap().push(*v));
        }
        registry.notify(&1);

        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn clear_removes_every_subscriber() {
        let registry: Registry<u32> = Registry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = seen.clone();
        let _a = registry.subscribe(move |v| first.lock().unwrap().push(*v));
        let second = seen.clone();
        let _b = registry.subscribe(move |v| second.lock().unwrap().push(*v));

        registry.clear();
        registry.notify(&9);

        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn unsubscribe_after_registry_is_gone_is_harmless() {
        let registry: Registry<u32> = Registry::new();
        let sub = registry.subscribe(|_| {});
        drop(registry);
        sub.unsubscribe();
    }
}
