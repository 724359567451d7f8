//! Ordered, panic-isolated observer fan-out.
//!
//! Press and status observers are registered by independent parts of the
//! game UI; one misbehaving observer must not rob the others of an event.
//! Delivery happens in subscription order and each callback runs inside a
//! panic boundary.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

use log::error;

type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

/// A list of subscribers for one event type.
pub struct Observers<T> {
    subscribers: Mutex<Vec<Callback<T>>>,
}

impl<T> Observers<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register an observer. Observers are never unregistered; they live as
    /// long as the manager that owns this list.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) {
        self.subscribers
            .lock()
            .expect("observer list poisoned")
            .push(Box::new(callback));
    }

    /// Deliver an event to every observer in subscription order. A panic in
    /// one observer is logged and does not interrupt delivery to the rest.
    pub fn emit(&self, event: &T) {
        let subscribers = self.subscribers.lock().expect("observer list poisoned");
        for (index, callback) in subscribers.iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                error!("observer {index} panicked while handling an event");
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.lock().expect("observer list poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn delivers_in_subscription_order() {
        let observers = Observers::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in 0..3 {
            let seen = seen.clone();
            observers.subscribe(move |value: &u32| {
                seen.lock().unwrap().push((tag, *value));
            });
        }

        observers.emit(&7);
        assert_eq!(*seen.lock().unwrap(), vec![(0, 7), (1, 7), (2, 7)]);
    }

    #[test]
    fn panicking_observer_does_not_block_others() {
        let observers = Observers::<()>::new();
        let delivered = Arc::new(AtomicUsize::new(0));

        observers.subscribe(|_| panic!("observer bug"));
        {
            let delivered = delivered.clone();
            observers.subscribe(move |_| {
                delivered.fetch_add(1, Ordering::SeqCst);
            });
        }

        observers.emit(&());
        observers.emit(&());
        assert_eq!(delivered.load(Ordering::SeqCst), 2);
    }
}
