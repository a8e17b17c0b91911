//! Confirmation before touching reconciled transactions
//!
//! A guarded operation comes back as a `PendingConfirmation` instead of
//! running. Handing the pending value back to the session runs it; dropping
//! it declines and leaves the session as it was.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::{Transaction, TransactionId};

/// Why the user is being asked to confirm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfirmReason {
    EditReconciled,
    DeleteReconciled,
    UnlockReconciled,
}

impl ConfirmReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EditReconciled => "editReconciled",
            Self::DeleteReconciled => "deleteReconciled",
            Self::UnlockReconciled => "unlockReconciled",
        }
    }

    /// Prompt shown to the user
    pub fn message(&self) -> &'static str {
        match self {
            Self::EditReconciled => {
                "This transaction is reconciled. Saving changes may put the account out of balance."
            }
            Self::DeleteReconciled => {
                "This transaction is reconciled. Deleting it may put the account out of balance."
            }
            Self::UnlockReconciled => {
                "Unlocking this reconciled transaction lets it be edited freely. The account may no longer match its reconciled balance."
            }
        }
    }
}

impl fmt::Display for ConfirmReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operation held back by the guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardedAction {
    Save,
    Delete(TransactionId),
    Unlock(TransactionId),
}

/// A guarded operation waiting for the user's answer
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a pending confirmation declines the operation"]
pub struct PendingConfirmation {
    pub(crate) session_id: Uuid,
    pub(crate) reason: ConfirmReason,
    pub(crate) action: GuardedAction,
}

impl PendingConfirmation {
    pub fn reason(&self) -> ConfirmReason {
        self.reason
    }

    pub fn action(&self) -> &GuardedAction {
        &self.action
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

/// Result of an operation that may need confirmation first
#[derive(Debug)]
pub enum Guarded<T> {
    Done(T),
    NeedsConfirmation(PendingConfirmation),
}

impl<T> Guarded<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

/// Answers confirmation prompts synchronously
pub trait Confirmer {
    fn confirm(&mut self, reason: ConfirmReason) -> bool;
}

/// A confirmer that always gives the same answer
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirmer for FixedAnswer {
    fn confirm(&mut self, _reason: ConfirmReason) -> bool {
        self.0
    }
}

/// Decides which operations need confirmation
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationGuard {
    confirm_child_delete: bool,
}

impl ReconciliationGuard {
    /// `confirm_child_delete` also guards deleting a single leg of a
    /// reconciled group
    pub fn new(confirm_child_delete: bool) -> Self {
        Self {
            confirm_child_delete,
        }
    }

    /// Saving is guarded when the parent is reconciled, or when any
    /// reconciled row differs from its stored version
    pub fn check_save(
        &self,
        original: &[Transaction],
        rows: &[Transaction],
    ) -> Option<ConfirmReason> {
        let parent_reconciled = rows.first().is_some_and(|parent| parent.reconciled);
        let reconciled_changed = rows
            .iter()
            .filter(|t| t.reconciled)
            .any(|t| original.iter().find(|o| o.id == t.id) != Some(t));

        (parent_reconciled || reconciled_changed).then_some(ConfirmReason::EditReconciled)
    }

    /// Deleting the parent is guarded when it is reconciled; deleting a leg
    /// only when child deletes are guarded too
    pub fn check_delete(&self, rows: &[Transaction], id: &TransactionId) -> Option<ConfirmReason> {
        let parent = rows.first()?;

        let guarded = if &parent.id == id {
            parent.reconciled
        } else {
            self.confirm_child_delete
                && (parent.reconciled || rows.iter().any(|t| &t.id == id && t.reconciled))
        };

        guarded.then_some(ConfirmReason::DeleteReconciled)
    }

    /// Unlocking always asks, and only reconciled rows can be unlocked
    pub fn check_unlock(&self, rows: &[Transaction], id: &TransactionId) -> Option<ConfirmReason> {
        rows.iter()
            .find(|t| &t.id == id && t.reconciled)
            .map(|_| ConfirmReason::UnlockReconciled)
    }
}
