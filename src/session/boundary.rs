//! Collaborators the edit session talks to
//!
//! Storage provides JSON-backed implementations of each of these; tests use
//! in-memory fakes.

use crate::error::SplitbookResult;
use crate::models::{Transaction, TransactionGroup, TransactionId};

use super::diff::Changes;

/// Loads a parent transaction together with its child legs
pub trait TransactionSource {
    /// Children must come back in creation order
    fn fetch_group(&self, parent_id: &TransactionId) -> SplitbookResult<TransactionGroup>;
}

/// Applies a whole batch of changes as one unit
pub trait BatchPersistence {
    /// Returns the rows as stored after the batch was applied
    fn batch_update(&self, changes: &Changes) -> SplitbookResult<Vec<Transaction>>;
}

/// Suggests field values for a transaction
///
/// There is no failure mode: returning the input unchanged means "no
/// suggestion".
pub trait RuleEngine {
    fn run(&self, transaction: &Transaction) -> Transaction;
}

/// Remembers the last transaction added so new sessions can reuse its
/// account and date
pub trait LastTransactionStore {
    fn last_transaction(&self) -> SplitbookResult<Option<Transaction>>;

    fn set_last_transaction(&self, transaction: &Transaction) -> SplitbookResult<()>;
}
