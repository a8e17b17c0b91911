//! Single-active-field coordination for an edit session
//!
//! The parent and every leg share one namespace of field keys. At most one
//! key is being edited at a time; every other field is disabled until the
//! active one is cleared.

use std::fmt;

use crate::models::{TransactionField, TransactionId};

/// Identifies one field of one row in the session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub transaction_id: TransactionId,
    pub field: TransactionField,
}

impl FieldKey {
    pub fn new(transaction_id: TransactionId, field: TransactionField) -> Self {
        Self {
            transaction_id,
            field,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.field, self.transaction_id)
    }
}

/// Runs when the active field is released
pub type OnDeactivate = Box<dyn FnOnce()>;

/// Runs when a field becomes active and may hand back an `OnDeactivate`
pub type OnActivate = Box<dyn FnOnce() -> Option<OnDeactivate>>;

/// Observable coordinator state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditState {
    Idle,
    Editing(FieldKey),
}

struct ActiveEdit {
    key: FieldKey,
    on_deactivate: Option<OnDeactivate>,
    pending: Option<String>,
}

/// Arbitrates which field of the session may be edited
#[derive(Default)]
pub struct ActiveEditCoordinator {
    active: Option<ActiveEdit>,
}

impl ActiveEditCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `key` the active field
    ///
    /// Returns `false` and changes nothing while another field is active.
    /// Asking again for the field that is already active is accepted without
    /// running `on_activate` a second time.
    pub fn request_active_edit(&mut self, key: FieldKey, on_activate: Option<OnActivate>) -> bool {
        if let Some(active) = &self.active {
            return active.key == key;
        }

        let on_deactivate = on_activate.and_then(|activate| activate());
        self.active = Some(ActiveEdit {
            key,
            on_deactivate,
            pending: None,
        });
        true
    }

    /// Release the active field, running its deactivation callback
    pub fn clear_active_edit(&mut self) {
        if let Some(active) = self.active.take() {
            if let Some(on_deactivate) = active.on_deactivate {
                on_deactivate();
            }
        }
    }

    pub fn state(&self) -> EditState {
        match &self.active {
            Some(active) => EditState::Editing(active.key.clone()),
            None => EditState::Idle,
        }
    }

    pub fn active_key(&self) -> Option<&FieldKey> {
        self.active.as_ref().map(|a| &a.key)
    }

    pub fn is_editing(&self, key: &FieldKey) -> bool {
        self.active_key() == Some(key)
    }

    /// Whether `key` must render disabled because another field is active
    pub fn is_disabled(&self, key: &FieldKey) -> bool {
        self.active_key().is_some_and(|active| active != key)
    }

    /// Keep the text typed into the active field so it can be flushed later
    ///
    /// Returns `false` when no field is active.
    pub fn stage(&mut self, text: impl Into<String>) -> bool {
        match &mut self.active {
            Some(active) => {
                active.pending = Some(text.into());
                true
            }
            None => false,
        }
    }

    /// Take the staged text of the active field, if any
    pub fn take_pending(&mut self) -> Option<(FieldKey, String)> {
        let active = self.active.as_mut()?;
        let text = active.pending.take()?;
        Some((active.key.clone(), text))
    }
}

impl fmt::Debug for ActiveEditCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveEditCoordinator")
            .field("state", &self.state())
            .finish()
    }
}
