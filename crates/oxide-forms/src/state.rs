//! Form session state and change events.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::ValidationErrors;
use crate::path::FieldPath;

/// A snapshot of a form session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    /// Session epoch; bumped by every reset.
    pub generation: u64,
    /// Current value set.
    pub values: Value,
    /// Field errors from the last validation, keyed by canonical path.
    pub errors: ValidationErrors,
    /// Paths that have been blurred at least once.
    pub touched: BTreeSet<String>,
    /// Whether the values differ from the last seeded baseline.
    pub dirty: bool,
    /// Whether the submit callback is currently running.
    pub submitting: bool,
    /// Whether the last submit of this session succeeded.
    pub submit_succeeded: bool,
    /// Number of submit attempts in this session.
    pub submit_count: u32,
}

impl FormState {
    /// Edits that would be lost on navigation.
    #[must_use]
    pub const fn has_unsaved_changes(&self) -> bool {
        self.dirty && !self.submit_succeeded
    }

    /// Whether no field errors are recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A change notification sent to controller subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// A field value was written.
    ValueChanged { path: FieldPath },
    /// A field lost focus.
    Blurred { path: FieldPath },
    /// The error map changed.
    ErrorsChanged,
    /// Validation passed and the submit callback is about to run.
    SubmitStarted,
    /// The submit callback finished.
    SubmitSettled { succeeded: bool },
    /// The session was replaced.
    Reset { generation: u64 },
}

impl FormEvent {
    /// Returns the field this event is about, if it is field-scoped.
    #[must_use]
    pub const fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::ValueChanged { path } | Self::Blurred { path } => Some(path),
            _ => None,
        }
    }
}
