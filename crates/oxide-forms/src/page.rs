//! Page-level navigation events.
//!
//! [`PageEvents`] stands in for the host page: listeners registered for the
//! before-unload event may cancel navigation and supply a warning message.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::observer::{Listeners, Subscription};

/// The event passed to before-unload listeners.
#[derive(Debug, Default)]
pub struct BeforeUnloadEvent {
    default_prevented: Cell<bool>,
    return_value: RefCell<Option<String>>,
}

impl BeforeUnloadEvent {
    /// Creates an event nobody has handled yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the host to confirm before leaving.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    /// Sets the message shown in the confirmation prompt.
    pub fn set_return_value(&self, message: impl Into<String>) {
        *self.return_value.borrow_mut() = Some(message.into());
    }

    /// Whether a listener cancelled the unload.
    #[must_use]
    pub const fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// The message set by the last listener, if any.
    #[must_use]
    pub fn return_value(&self) -> Option<String> {
        self.return_value.borrow().clone()
    }
}

/// Registry of page-level event listeners.
///
/// Clones share the same registry.
#[derive(Clone)]
pub struct PageEvents {
    before_unload: Rc<Listeners<BeforeUnloadEvent>>,
}

thread_local! {
    static CURRENT: PageEvents = PageEvents::new();
}

impl PageEvents {
    /// Creates an isolated registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            before_unload: Rc::new(Listeners::new()),
        }
    }

    /// Returns the registry for the current page (one per thread).
    #[must_use]
    pub fn current() -> Self {
        CURRENT.with(Clone::clone)
    }

    /// Registers a before-unload listener.
    pub fn on_before_unload(&self, listener: impl Fn(&BeforeUnloadEvent) + 'static) -> Subscription {
        self.before_unload.add(listener)
    }

    /// Simulates the user leaving the page and returns the handled event.
    #[must_use]
    pub fn dispatch_before_unload(&self) -> BeforeUnloadEvent {
        let event = BeforeUnloadEvent::new();
        self.before_unload.emit(&event);
        event
    }

    /// Number of registered before-unload listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.before_unload.len()
    }
}

impl Default for PageEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PageEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageEvents")
            .field("before_unload", &self.before_unload.len())
            .finish()
    }
}
