//! Turning a finished working set into one persistence batch

use tracing::{info, warn};

use crate::error::SplitbookResult;
use crate::models::{Money, Transaction};

use super::boundary::{BatchPersistence, LastTransactionStore};
use super::diff::{diff_items, Changes};
use super::guard::PendingConfirmation;
use super::splits::realize_temp_transactions;

/// What a commit attempt did
#[derive(Debug)]
pub enum CommitOutcome {
    Committed(CommitReport),
    /// The working set matches what was fetched
    NothingToCommit,
    /// The legs do not add up to the parent amount
    Unbalanced { difference: Money },
    /// A row has no account; the form is incomplete
    MissingAccount,
    /// The parent is reconciled and the user has to confirm first
    AwaitingConfirmation(PendingConfirmation),
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

/// Details of a successful commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    /// The batch that was sent
    pub changes: Changes,
    /// Rows returned by the persistence layer
    pub persisted: Vec<Transaction>,
    /// The working set after temporary ids were realized
    pub transactions: Vec<Transaction>,
    /// Whether the last-used defaults were updated
    pub remembered_last: bool,
}

/// Reasons the working set cannot be saved yet
pub(crate) fn validate(rows: &[Transaction]) -> Option<CommitOutcome> {
    if let Some(parent) = rows.first() {
        let difference = parent.split_difference();
        if parent.is_parent && !difference.is_zero() {
            return Some(CommitOutcome::Unbalanced { difference });
        }
    }

    if rows.iter().any(|t| t.account.is_none()) {
        warn!("Commit aborted, a transaction has no account");
        return Some(CommitOutcome::MissingAccount);
    }

    None
}

/// Realize, diff and persist `rows` against `original`
///
/// The batch is only sent when it is non-empty. For new sessions the parent
/// is remembered as the last-used transaction.
pub(crate) fn persist(
    original: &[Transaction],
    rows: &[Transaction],
    adding: bool,
    persistence: &dyn BatchPersistence,
    last: &dyn LastTransactionStore,
) -> SplitbookResult<CommitReport> {
    let transactions = if adding {
        realize_temp_transactions(rows)
    } else {
        rows.to_vec()
    };

    let changes = diff_items(original, &transactions);
    let persisted = if changes.is_empty() {
        Vec::new()
    } else {
        persistence.batch_update(&changes)?
    };

    info!(
        added = changes.added.len(),
        updated = changes.updated.len(),
        deleted = changes.deleted.len(),
        "Committed split session"
    );

    let remembered_last = match (adding, transactions.first()) {
        (true, Some(parent)) => {
            last.set_last_transaction(parent)?;
            true
        }
        _ => false,
    };

    Ok(CommitReport {
        changes,
        persisted,
        transactions,
        remembered_last,
    })
}
