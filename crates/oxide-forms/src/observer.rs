//! Listener lists with RAII unsubscription.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<E> = Rc<dyn Fn(&E)>;

struct ListenerSet<E> {
    next_id: u64,
    entries: Vec<(u64, Callback<E>)>,
}

/// A list of callbacks notified with events of type `E`.
pub struct Listeners<E> {
    inner: Rc<RefCell<ListenerSet<E>>>,
}

impl<E: 'static> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> Listeners<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ListenerSet {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Adds a callback; it stays registered until the returned value drops.
    pub fn add(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        let id = {
            let mut set = self.inner.borrow_mut();
            let id = set.next_id;
            set.next_id += 1;
            set.entries.push((id, Rc::new(callback)));
            id
        };

        let weak: Weak<RefCell<ListenerSet<E>>> = Rc::downgrade(&self.inner);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(set) = weak.upgrade() {
                    set.borrow_mut().entries.retain(|(entry, _)| *entry != id);
                }
            })),
        }
    }

    /// Calls every callback registered at the time of the call.
    ///
    /// No borrow is held while callbacks run, so they may subscribe,
    /// unsubscribe or trigger further notifications.
    pub fn emit(&self, event: &E) {
        let callbacks: Vec<Callback<E>> = self
            .inner
            .borrow()
            .entries
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }
}

/// Keeps a listener registered; dropping it deregisters the listener.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Deregisters the listener now.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_emit_and_drop() {
        let listeners = Listeners::<u32>::new();
        let seen = Rc::new(Cell::new(0));

        let counter = Rc::clone(&seen);
        let subscription = listeners.add(move |n| counter.set(counter.get() + n));
        listeners.emit(&2);
        listeners.emit(&3);
        assert_eq!(seen.get(), 5);

        drop(subscription);
        assert_eq!(listeners.len(), 0);
        listeners.emit(&10);
        assert_eq!(seen.get(), 5);
    }

    #[test]
    fn test_subscription_outlives_listeners() {
        let listeners = Listeners::<()>::new();
        let subscription = listeners.add(|()| {});
        drop(listeners);
        subscription.unsubscribe();
    }

    #[test]
    fn test_callback_may_subscribe_during_emit() {
        let listeners = Rc::new(Listeners::<()>::new());
        let inner = Rc::clone(&listeners);
        let held = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&held);
        let _outer = listeners.add(move |()| sink.borrow_mut().push(inner.add(|()| {})));
        listeners.emit(&());
        assert_eq!(listeners.len(), 2);
    }
}
