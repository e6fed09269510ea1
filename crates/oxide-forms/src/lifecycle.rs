//! Identity-key resets and unsaved-changes protection.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::controller::FormController;
use crate::observer::Subscription;
use crate::page::PageEvents;
use crate::schema::Schema;

/// Identifies the record a form is editing.
///
/// When the key changes the form starts a fresh session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormKey {
    Text(String),
    Number(i64),
}

impl From<&str> for FormKey {
    fn from(key: &str) -> Self {
        Self::Text(key.to_string())
    }
}

impl From<String> for FormKey {
    fn from(key: String) -> Self {
        Self::Text(key)
    }
}

impl From<i64> for FormKey {
    fn from(key: i64) -> Self {
        Self::Number(key)
    }
}

impl fmt::Display for FormKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(key) => f.write_str(key),
            Self::Number(key) => write!(f, "{key}"),
        }
    }
}

/// Remembers the last identity key and reports transitions.
#[derive(Debug, Clone, Default)]
pub struct KeyTracker {
    current: Option<FormKey>,
}

impl KeyTracker {
    /// Starts tracking from the key the form was created with.
    #[must_use]
    pub const fn new(initial: Option<FormKey>) -> Self {
        Self { current: initial }
    }

    /// Returns the last key seen.
    #[must_use]
    pub const fn current(&self) -> Option<&FormKey> {
        self.current.as_ref()
    }

    /// Records `key` and returns whether it differs from the last one.
    ///
    /// An absent key never counts as a transition and does not clear the
    /// remembered key.
    pub fn observe(&mut self, key: Option<&FormKey>) -> bool {
        match key {
            Some(key) if self.current.as_ref() != Some(key) => {
                self.current = Some(key.clone());
                true
            }
            _ => false,
        }
    }
}

struct GuardState {
    page: PageEvents,
    enabled: Cell<bool>,
    message: Rc<RefCell<String>>,
    has_unsaved_changes: Box<dyn Fn() -> bool>,
    listener: RefCell<Option<Subscription>>,
}

impl GuardState {
    /// Registers or releases the unload listener to match the current
    /// activation condition.
    fn refresh(&self) {
        let active = self.enabled.get() && (self.has_unsaved_changes)();
        let mut listener = self.listener.borrow_mut();
        match (active, listener.is_some()) {
            (true, false) => {
                let message = Rc::clone(&self.message);
                *listener = Some(self.page.on_before_unload(move |event| {
                    event.prevent_default();
                    event.set_return_value(message.borrow().clone());
                }));
                debug!("Registered unload listener");
            }
            (false, true) => {
                *listener = None;
                debug!("Released unload listener");
            }
            _ => {}
        }
    }
}

/// Asks for confirmation before the page is left with unsaved edits.
///
/// An unload listener is registered only while the guard is enabled and
/// the form is dirty without a successful submit. Dropping the guard
/// releases the listener.
pub struct UnsavedChangesGuard {
    state: Rc<GuardState>,
    _events: Subscription,
}

impl UnsavedChangesGuard {
    /// Starts watching `controller`.
    #[must_use]
    pub fn attach<S: Schema>(
        controller: &FormController<S>,
        page: PageEvents,
        enabled: bool,
        message: impl Into<String>,
    ) -> Self {
        let source = controller.clone();
        let state = Rc::new(GuardState {
            page,
            enabled: Cell::new(enabled),
            message: Rc::new(RefCell::new(message.into())),
            has_unsaved_changes: Box::new(move || source.state().has_unsaved_changes()),
            listener: RefCell::new(None),
        });

        let watched = Rc::clone(&state);
        let events = controller.subscribe(move |_| watched.refresh());
        state.refresh();

        Self {
            state,
            _events: events,
        }
    }

    /// Turns the protection on or off.
    pub fn set_enabled(&self, enabled: bool) {
        self.state.enabled.set(enabled);
        self.state.refresh();
    }

    /// Whether protection is turned on.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state.enabled.get()
    }

    /// Replaces the warning message.
    pub fn set_message(&self, message: impl Into<String>) {
        *self.state.message.borrow_mut() = message.into();
    }

    /// Whether an unload listener is currently registered.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.state.listener.borrow().is_some()
    }
}

impl Drop for UnsavedChangesGuard {
    fn drop(&mut self) {
        if self.state.listener.borrow_mut().take().is_some() {
            debug!("Released unload listener");
        }
    }
}

impl fmt::Debug for UnsavedChangesGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnsavedChangesGuard")
            .field("enabled", &self.is_enabled())
            .field("armed", &self.is_armed())
            .finish_non_exhaustive()
    }
}
