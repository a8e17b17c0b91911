//! Rule-based auto-fill for new transactions
//!
//! Suggestions from the rule engine only ever fill fields the user has left
//! unset. Saved transactions are never auto-filled.

use tracing::debug;
use uuid::Uuid;

use crate::models::{Transaction, TransactionId};

use super::boundary::RuleEngine;

/// A rule-engine call issued for one row of one session
///
/// The suggestion is merged with `SplitSession::finish_autofill`, which drops
/// it if the session or row has moved on in the meantime.
#[derive(Debug, Clone)]
pub struct AutofillRequest {
    pub(crate) session_id: Uuid,
    pub(crate) transaction: Transaction,
}

impl AutofillRequest {
    /// The row as it was when the request was made
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction.id
    }

    /// Run the request against a rule engine
    pub fn run(&self, rules: &dyn RuleEngine) -> Transaction {
        rules.run(&self.transaction)
    }
}

/// Fill unset fields of `current` from `suggestion`
///
/// A field counts as unset when it is `None`, empty, zero or `false`.
/// Identity, split flags and the date are never taken from the suggestion.
pub fn merge_suggestion(current: &Transaction, suggestion: &Transaction) -> Transaction {
    let mut merged = current.clone();
    let mut filled = Vec::new();

    if merged.account.is_none() && suggestion.account.is_some() {
        merged.account = suggestion.account;
        filled.push("account");
    }
    if merged.payee.is_none() && suggestion.payee.is_some() {
        merged.payee = suggestion.payee;
        filled.push("payee");
    }
    if merged.category.is_none() && suggestion.category.is_some() {
        merged.category = suggestion.category;
        filled.push("category");
    }
    if merged.amount.is_zero() && !suggestion.amount.is_zero() {
        merged.amount = suggestion.amount;
        filled.push("amount");
    }
    if merged.notes.is_empty() && !suggestion.notes.is_empty() {
        merged.notes = suggestion.notes.clone();
        filled.push("notes");
    }
    if !merged.cleared && suggestion.cleared {
        merged.cleared = true;
        filled.push("cleared");
    }

    if !filled.is_empty() {
        debug!(transaction = %merged.id, fields = ?filled, "Applied rule suggestions");
    }
    merged
}

/// Run the rules for a temporary transaction and merge the result
///
/// Saved transactions are returned unchanged without calling the engine.
pub fn autofill(transaction: &Transaction, rules: &dyn RuleEngine) -> Transaction {
    if !transaction.is_temporary() {
        return transaction.clone();
    }
    merge_suggestion(transaction, &rules.run(transaction))
}
